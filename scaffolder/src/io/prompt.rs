//! Seed transcripts and follow-up prompts for both use cases.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use tracing::debug;

use crate::core::completion::CompletionPhrases;
use crate::core::features::FeatureSelection;
use crate::core::types::Message;

const GENERATION_SYSTEM_TEMPLATE: &str = include_str!("prompts/generation_system.md");
const GENERATION_TASK_TEMPLATE: &str = include_str!("prompts/generation_task.md");
const FEATURE_SYSTEM_TEMPLATE: &str = include_str!("prompts/feature_system.md");
const FEATURE_TASK_TEMPLATE: &str = include_str!("prompts/feature_task.md");

pub const GENERATION_CONTINUE_PROMPT: &str =
    "Please continue with the next steps to complete the project structure.";
pub const FEATURE_CONTINUE_PROMPT: &str =
    "Please continue with the next steps to complete the feature implementation.";

pub const GENERATION_SUMMARY_PROMPT: &str = "Provide a summary of what you've created, including the project structure, the files and the key features.";
pub const FEATURE_SUMMARY_PROMPT: &str = "Provide a summary of the feature you've added, including which files were created or modified and how the feature works.";

/// Inputs of a project generation request.
#[derive(Debug, Clone, Copy)]
pub struct GenerationPrompt<'a> {
    pub project_name: &'a str,
    pub project_type: &'a str,
    pub description: &'a str,
    pub features: FeatureSelection,
}

/// Inputs of a feature addition request.
#[derive(Debug, Clone, Copy)]
pub struct FeaturePrompt<'a> {
    pub project_name: &'a str,
    pub project_type: &'a str,
    pub feature_description: &'a str,
    pub files: &'a [String],
    pub directories: &'a [String],
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        for (name, source) in [
            ("generation_system", GENERATION_SYSTEM_TEMPLATE),
            ("generation_task", GENERATION_TASK_TEMPLATE),
            ("feature_system", FEATURE_SYSTEM_TEMPLATE),
            ("feature_task", FEATURE_TASK_TEMPLATE),
        ] {
            env.add_template(name, source)
                .with_context(|| format!("load {name} template"))?;
        }
        Ok(Self { env })
    }

    /// System and user messages that open a generation transcript.
    pub fn generation_messages(&self, input: &GenerationPrompt<'_>) -> Result<Vec<Message>> {
        let directives = input.features.directives();
        let system = self.render(
            "generation_system",
            context! {
                completion_phrase => CompletionPhrases::Generation.primary(),
            },
        )?;
        let task = self.render(
            "generation_task",
            context! {
                project_type => input.project_type.trim(),
                project_name => input.project_name.trim(),
                description => input.description.trim(),
                include => directives.include,
                exclude => directives.exclude,
            },
        )?;
        debug!(system_len = system.len(), task_len = task.len(), "rendered generation prompts");
        Ok(vec![Message::system(system), Message::user(task)])
    }

    /// System and user messages that open a feature addition transcript.
    pub fn feature_messages(&self, input: &FeaturePrompt<'_>) -> Result<Vec<Message>> {
        let system = self.render(
            "feature_system",
            context! {
                completion_phrase => CompletionPhrases::FeatureAddition.primary(),
            },
        )?;
        let task = self.render(
            "feature_task",
            context! {
                project_type => input.project_type.trim(),
                project_name => input.project_name.trim(),
                feature_description => input.feature_description.trim(),
                files => input.files,
                directories => input.directories,
            },
        )?;
        debug!(system_len = system.len(), task_len = task.len(), "rendered feature prompts");
        Ok(vec![Message::system(system), Message::user(task)])
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        let rendered = template
            .render(ctx)
            .with_context(|| format!("render {name} template"))?;
        Ok(rendered.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Role;

    #[test]
    fn generation_prompt_lists_included_and_excluded_features() {
        let engine = PromptEngine::new().expect("engine");
        let messages = engine
            .generation_messages(&GenerationPrompt {
                project_name: "todo-api",
                project_type: "FastAPI",
                description: "A small todo service",
                features: FeatureSelection::default(),
            })
            .expect("render");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);

        let system = messages[0].text_or_empty();
        assert!(system.contains("project generation is complete"));
        assert!(system.contains("sudo"));

        let task = messages[1].text_or_empty();
        assert!(task.contains("FastAPI project named 'todo-api'"));
        assert!(task.contains("- Git initialization with appropriate .gitignore"));
        assert!(task.contains("- Testing framework with sample tests"));
        assert!(task.contains("- Do NOT include any GitHub Actions or CI/CD workflow files"));
        assert!(!task.contains("- GitHub Actions CI/CD workflows"));
    }

    #[test]
    fn generation_prompt_without_features_has_no_include_section() {
        let engine = PromptEngine::new().expect("engine");
        let messages = engine
            .generation_messages(&GenerationPrompt {
                project_name: "bare",
                project_type: "Rust CLI",
                description: "nothing extra",
                features: FeatureSelection {
                    git: false,
                    tests: false,
                    github_actions: false,
                    docs: false,
                },
            })
            .expect("render");
        let task = messages[1].text_or_empty();
        assert!(!task.contains("Include the following features"));
        assert!(task.contains("Do NOT initialize Git"));
    }

    #[test]
    fn feature_prompt_lists_known_structure() {
        let engine = PromptEngine::new().expect("engine");
        let files = vec!["README.md".to_string(), "src/app.py".to_string()];
        let directories = vec!["src".to_string()];
        let messages = engine
            .feature_messages(&FeaturePrompt {
                project_name: "todo-api",
                project_type: "FastAPI",
                feature_description: "add JWT authentication",
                files: &files,
                directories: &directories,
            })
            .expect("render");

        assert!(messages[0].text_or_empty().contains("feature implementation is complete"));
        let task = messages[1].text_or_empty();
        assert!(task.contains("- README.md"));
        assert!(task.contains("- src/app.py"));
        assert!(task.contains("Directories:\n- src"));
        assert!(task.contains("add JWT authentication"));
    }
}
