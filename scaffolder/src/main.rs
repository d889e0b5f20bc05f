//! Project scaffolding agent CLI.
//!
//! Drives a tool-calling chat model that creates a new project, or adds a
//! feature to one, inside a single project directory.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::Confirm;
use tracing::debug;

use scaffolder::core::catalog::tool_catalog;
use scaffolder::core::features::{Feature, FeatureSelection};
use scaffolder::core::results::{FeatureResult, GenerationResult};
use scaffolder::dispatch::ToolDispatcher;
use scaffolder::exit_codes;
use scaffolder::io::command::CommandRunner;
use scaffolder::io::config::{DEFAULT_CONFIG_FILE, ScaffoldConfig, load_config, write_config};
use scaffolder::io::openai::OpenAiProvider;
use scaffolder::io::prompt::PromptEngine;
use scaffolder::io::sandbox::SandboxedFileStore;
use scaffolder::io::summary::{find_summary, load_summary, write_summary};
use scaffolder::logging;
use scaffolder::looping::LoopStop;
use scaffolder::session::{FeatureRequest, GenerationRequest, add_feature, generate_project};

#[derive(Parser)]
#[command(
    name = "scaffolder",
    version,
    about = "LLM agent that scaffolds projects and adds features to them"
)]
struct Cli {
    /// Configuration file (defaults apply when it does not exist).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a new project from a description.
    Generate {
        /// Project name.
        #[arg(long)]
        name: String,
        /// Project type, e.g. "FastAPI service" or "React app".
        #[arg(long = "type")]
        project_type: String,
        /// What the project should do.
        #[arg(long)]
        description: String,
        /// Project directory (default: `projects/<name>`).
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Enable an optional feature.
        #[arg(long = "with", value_enum)]
        with: Vec<FeatureArg>,
        /// Disable an optional feature.
        #[arg(long, value_enum)]
        without: Vec<FeatureArg>,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Add a feature to a previously generated project.
    Extend {
        /// Project directory.
        #[arg(long)]
        dir: PathBuf,
        /// Feature to add.
        #[arg(long)]
        feature: String,
        /// Generation summary to read the project structure from
        /// (default: the `*_generation_summary.json` in the project directory).
        #[arg(long)]
        summary: Option<PathBuf>,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the tool catalog offered to the model.
    Catalog,
    /// Write a config file with default values.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeatureArg {
    Git,
    Tests,
    GithubActions,
    Docs,
}

impl From<FeatureArg> for Feature {
    fn from(arg: FeatureArg) -> Self {
        match arg {
            FeatureArg::Git => Feature::Git,
            FeatureArg::Tests => Feature::Tests,
            FeatureArg::GithubActions => Feature::GithubActions,
            FeatureArg::Docs => Feature::Docs,
        }
    }
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            name,
            project_type,
            description,
            dir,
            with,
            without,
            yes,
        } => {
            let mut features = FeatureSelection::default();
            for arg in with {
                features.set(arg.into(), true);
            }
            for arg in without {
                features.set(arg.into(), false);
            }
            cmd_generate(
                &cli.config,
                GenerateArgs {
                    name,
                    project_type,
                    description,
                    dir,
                    features,
                    yes,
                },
            )
        }
        Command::Extend {
            dir,
            feature,
            summary,
            yes,
        } => cmd_extend(&cli.config, &dir, feature, summary, yes),
        Command::Catalog => cmd_catalog(),
        Command::InitConfig { force } => cmd_init_config(&cli.config, force),
    }
}

struct GenerateArgs {
    name: String,
    project_type: String,
    description: String,
    dir: Option<PathBuf>,
    features: FeatureSelection,
    yes: bool,
}

fn cmd_generate(config_path: &Path, args: GenerateArgs) -> Result<i32> {
    if args.name.trim().is_empty() {
        bail!("--name must not be empty");
    }
    let cfg = load_config(config_path)?;
    let provider = build_provider(&cfg)?;

    let project_dir = args
        .dir
        .unwrap_or_else(|| default_project_dir(&args.name));
    fs::create_dir_all(&project_dir)
        .with_context(|| format!("create project directory {}", project_dir.display()))?;

    println!("Project:     {} ({})", args.name, args.project_type);
    println!("Directory:   {}", project_dir.display());
    println!("Description: {}", args.description);
    for feature in Feature::ALL {
        let state = if args.features.is_enabled(feature) {
            "yes"
        } else {
            "no"
        };
        println!("  {:<20} {state}", feature.label());
    }
    if !confirm("Generate this project?", args.yes)? {
        println!("Cancelled.");
        return Ok(exit_codes::OK);
    }

    let dispatcher = build_dispatcher(&cfg, &project_dir)?;
    let prompts = PromptEngine::new()?;
    let request = GenerationRequest {
        project_name: args.name,
        project_type: args.project_type,
        description: args.description,
        features: args.features,
        model: cfg.provider.model.clone(),
        max_steps: cfg.limits.generation_max_steps,
    };
    let report = generate_project(&provider, &dispatcher, &prompts, &request, print_progress)?;
    let summary_path = write_summary(&project_dir, &report.result)?;

    print_generation(&report.result);
    println!("\nSummary saved to {}", summary_path.display());
    Ok(report_stop(&report.stop))
}

fn cmd_extend(
    config_path: &Path,
    project_dir: &Path,
    feature: String,
    summary: Option<PathBuf>,
    yes: bool,
) -> Result<i32> {
    if feature.trim().is_empty() {
        bail!("--feature must not be empty");
    }
    let cfg = load_config(config_path)?;
    let summary_path = match summary {
        Some(path) => path,
        None => find_summary(project_dir)?.with_context(|| {
            format!(
                "no generation summary found in {} (pass --summary)",
                project_dir.display()
            )
        })?,
    };
    let generation = load_summary(&summary_path)?;
    let provider = build_provider(&cfg)?;

    println!(
        "Project:   {} ({})",
        generation.project_name, generation.project_type
    );
    println!("Directory: {}", project_dir.display());
    println!(
        "Known:     {} files, {} directories",
        generation.files_created.len(),
        generation.directories_created.len()
    );
    println!("Feature:   {feature}");
    if !confirm("Add this feature?", yes)? {
        println!("Cancelled.");
        return Ok(exit_codes::OK);
    }

    let dispatcher = build_dispatcher(&cfg, project_dir)?;
    let prompts = PromptEngine::new()?;
    let request = FeatureRequest {
        project_name: generation.project_name,
        project_type: generation.project_type,
        feature_description: feature,
        known_files: generation.files_created,
        known_directories: generation.directories_created,
        model: cfg.provider.model.clone(),
        max_steps: cfg.limits.feature_max_steps,
    };
    let report = add_feature(&provider, &dispatcher, &prompts, &request, print_progress)?;

    print_feature(&report.result);
    Ok(report_stop(&report.stop))
}

fn cmd_catalog() -> Result<i32> {
    let catalog = serde_json::to_string_pretty(&tool_catalog()).context("serialize catalog")?;
    println!("{catalog}");
    Ok(exit_codes::OK)
}

fn cmd_init_config(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &ScaffoldConfig::default())?;
    println!("Wrote {}", path.display());
    Ok(exit_codes::OK)
}

fn build_provider(cfg: &ScaffoldConfig) -> Result<OpenAiProvider> {
    if let Err(err) = dotenvy::dotenv() {
        debug!(err = %err, "no .env loaded");
    }
    let key_env = &cfg.provider.api_key_env;
    let api_key = env::var(key_env).with_context(|| format!("read API key from ${key_env}"))?;
    OpenAiProvider::new(
        &cfg.provider.base_url,
        api_key,
        cfg.provider.request_timeout(),
    )
}

fn build_dispatcher(cfg: &ScaffoldConfig, project_dir: &Path) -> Result<ToolDispatcher> {
    let files = SandboxedFileStore::new(project_dir)?;
    let commands = CommandRunner::new(
        files.root(),
        cfg.commands.timeout(),
        cfg.commands.output_limit_bytes,
    );
    Ok(ToolDispatcher::new(files, commands))
}

/// `projects/<name>` with the name lowercased and spaces replaced by `_`.
fn default_project_dir(name: &str) -> PathBuf {
    Path::new("projects").join(name.trim().to_lowercase().replace(' ', "_"))
}

fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()
        .context("read confirmation")
}

fn print_progress(step: u32, max_steps: u32, message: &str) {
    println!("[{step}/{max_steps}] {message}");
}

/// Report how the loop stopped and map it to an exit code.
fn report_stop(stop: &LoopStop) -> i32 {
    match stop {
        LoopStop::Complete => exit_codes::OK,
        LoopStop::BudgetExhausted { max_steps } => {
            eprintln!("Stopped after {max_steps} steps without the model declaring completion.");
            exit_codes::BUDGET_EXHAUSTED
        }
        LoopStop::Failed { error } => {
            eprintln!("Provider call failed: {error}");
            exit_codes::PROVIDER_FAILED
        }
    }
}

fn print_generation(result: &GenerationResult) {
    println!(
        "\nGenerated '{}' in {} steps ({:.1}s)",
        result.project_name, result.total_steps, result.generation_time_seconds
    );
    print_list("Directories created", &result.directories_created);
    print_list("Files created", &result.files_created);
    print_summary(&result.summary);
}

fn print_feature(result: &FeatureResult) {
    println!(
        "\nAdded '{}' to '{}' in {} steps ({:.1}s)",
        result.feature_description,
        result.project_name,
        result.total_steps,
        result.feature_addition_time_seconds
    );
    print_list("New directories", &result.new_directories);
    print_list("New files", &result.new_files);
    print_list("Modified files", &result.modified_files);
    print_summary(&result.summary);
}

fn print_list(title: &str, items: &[String]) {
    println!("{title} ({}):", items.len());
    for item in items {
        println!("  - {item}");
    }
}

fn print_summary(summary: &str) {
    if !summary.trim().is_empty() {
        println!("\n{}", summary.trim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dir_normalizes_name() {
        assert_eq!(
            default_project_dir("My Cool App"),
            Path::new("projects").join("my_cool_app")
        );
    }

    #[test]
    fn cli_parses_feature_toggles() {
        let cli = Cli::try_parse_from([
            "scaffolder",
            "generate",
            "--name",
            "demo",
            "--type",
            "Flask",
            "--description",
            "a demo",
            "--with",
            "docs",
            "--without",
            "git",
            "--yes",
        ])
        .expect("parse");
        let Command::Generate {
            with, without, yes, ..
        } = cli.command
        else {
            panic!("expected generate");
        };
        assert!(matches!(with.as_slice(), [FeatureArg::Docs]));
        assert!(matches!(without.as_slice(), [FeatureArg::Git]));
        assert!(yes);
    }

    #[test]
    fn stop_maps_to_exit_codes() {
        assert_eq!(report_stop(&LoopStop::Complete), exit_codes::OK);
        assert_eq!(
            report_stop(&LoopStop::BudgetExhausted { max_steps: 5 }),
            exit_codes::BUDGET_EXHAUSTED
        );
        assert_eq!(
            report_stop(&LoopStop::Failed {
                error: "boom".to_string()
            }),
            exit_codes::PROVIDER_FAILED
        );
    }
}
