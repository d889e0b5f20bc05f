//! Scaffolder configuration stored in `scaffolder.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name, resolved against the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "scaffolder.toml";

/// Scaffolder configuration (TOML).
///
/// Missing fields fall back to the defaults below, so an empty file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScaffoldConfig {
    pub provider: ProviderConfig,
    pub limits: LimitsConfig,
    pub commands: CommandsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderConfig {
    pub model: String,
    /// Base URL of an OpenAI-compatible API, without `/chat/completions`.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_secs: 300,
        }
    }
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Step budgets per use case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsConfig {
    pub generation_max_steps: u32,
    pub feature_max_steps: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            generation_max_steps: 25,
            feature_max_steps: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandsConfig {
    /// Wall-clock limit for one `run_command` call.
    pub timeout_secs: u64,
    /// Truncate each of stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            output_limit_bytes: 100_000,
        }
    }
}

impl CommandsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ScaffoldConfig {
    pub fn validate(&self) -> Result<()> {
        if self.provider.model.trim().is_empty() {
            return Err(anyhow!("provider.model must not be empty"));
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(anyhow!("provider.base_url must not be empty"));
        }
        if self.provider.api_key_env.trim().is_empty() {
            return Err(anyhow!("provider.api_key_env must not be empty"));
        }
        if self.provider.request_timeout_secs == 0 {
            return Err(anyhow!("provider.request_timeout_secs must be > 0"));
        }
        if self.limits.generation_max_steps == 0 {
            return Err(anyhow!("limits.generation_max_steps must be > 0"));
        }
        if self.limits.feature_max_steps == 0 {
            return Err(anyhow!("limits.feature_max_steps must be > 0"));
        }
        if self.commands.timeout_secs == 0 {
            return Err(anyhow!("commands.timeout_secs must be > 0"));
        }
        if self.commands.output_limit_bytes == 0 {
            return Err(anyhow!("commands.output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ScaffoldConfig::default()`.
pub fn load_config(path: &Path) -> Result<ScaffoldConfig> {
    if !path.exists() {
        let cfg = ScaffoldConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ScaffoldConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ScaffoldConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, ScaffoldConfig::default());
        assert_eq!(cfg.limits.generation_max_steps, 25);
        assert_eq!(cfg.limits.feature_max_steps, 15);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("scaffolder.toml");
        let mut cfg = ScaffoldConfig::default();
        cfg.provider.model = "gpt-4o-mini".to_string();
        cfg.commands.timeout_secs = 30;
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("scaffolder.toml");
        fs::write(&path, "[limits]\nfeature_max_steps = 4\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.limits.feature_max_steps, 4);
        assert_eq!(cfg.limits.generation_max_steps, 25);
        assert_eq!(cfg.provider, ProviderConfig::default());
    }

    #[test]
    fn zero_budget_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("scaffolder.toml");
        fs::write(&path, "[limits]\ngeneration_max_steps = 0\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("generation_max_steps"));
    }

    #[test]
    fn empty_model_is_rejected() {
        let mut cfg = ScaffoldConfig::default();
        cfg.provider.model = "  ".to_string();
        assert!(cfg.validate().is_err());
    }
}
