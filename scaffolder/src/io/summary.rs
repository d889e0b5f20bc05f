//! Generation summary persistence inside the project directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::results::GenerationResult;

const SUMMARY_SUFFIX: &str = "_generation_summary.json";

/// `<project_name>_generation_summary.json`, with path separators replaced by `_`.
pub fn summary_file_name(project_name: &str) -> String {
    let sanitized: String = project_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{sanitized}{SUMMARY_SUFFIX}")
}

pub fn summary_path(project_dir: &Path, project_name: &str) -> PathBuf {
    project_dir.join(summary_file_name(project_name))
}

/// Atomically write the summary as pretty JSON (temp file + rename).
pub fn write_summary(project_dir: &Path, result: &GenerationResult) -> Result<PathBuf> {
    let path = summary_path(project_dir, &result.project_name);
    let mut buf = serde_json::to_string_pretty(result).context("serialize generation summary")?;
    buf.push('\n');

    fs::create_dir_all(project_dir)
        .with_context(|| format!("create directory {}", project_dir.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp summary {}", tmp_path.display()))?;
    fs::rename(&tmp_path, &path).with_context(|| format!("replace summary {}", path.display()))?;
    info!(path = %path.display(), "wrote generation summary");
    Ok(path)
}

pub fn load_summary(path: &Path) -> Result<GenerationResult> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let result: GenerationResult =
        serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    debug!(path = %path.display(), project = %result.project_name, "loaded generation summary");
    Ok(result)
}

/// First generation summary in `project_dir`, by file name.
pub fn find_summary(project_dir: &Path) -> Result<Option<PathBuf>> {
    let entries = fs::read_dir(project_dir)
        .with_context(|| format!("read directory {}", project_dir.display()))?;
    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", project_dir.display()))?;
        let name = entry.file_name();
        if name.to_string_lossy().ends_with(SUMMARY_SUFFIX) && entry.path().is_file() {
            candidates.push(entry.path());
        }
    }
    candidates.sort();
    Ok(candidates.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::FeatureSelection;
    use crate::core::types::{ActionRecord, ToolResult};
    use serde_json::Map;

    fn sample(name: &str) -> GenerationResult {
        GenerationResult {
            project_name: name.to_string(),
            project_type: "Flask".to_string(),
            total_steps: 3,
            total_files: 1,
            total_directories: 1,
            files_created: vec!["src/app.py".to_string()],
            directories_created: vec!["src".to_string()],
            generation_time_seconds: 1.5,
            summary: "A Flask app.".to_string(),
            features: FeatureSelection::default(),
            actions: vec![ActionRecord::Tool {
                step: 1,
                action: "create_directory".to_string(),
                args: Map::new(),
                result: ToolResult::success(true),
            }],
        }
    }

    #[test]
    fn file_name_replaces_path_separators() {
        assert_eq!(summary_file_name("demo"), "demo_generation_summary.json");
        assert_eq!(
            summary_file_name("team/demo\\v2"),
            "team_demo_v2_generation_summary.json"
        );
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = sample("demo");
        let path = write_summary(temp.path(), &result).expect("write");
        assert_eq!(path, temp.path().join("demo_generation_summary.json"));
        assert!(!temp.path().join("demo_generation_summary.json.tmp").exists());
        assert_eq!(load_summary(&path).expect("load"), result);
    }

    #[test]
    fn find_summary_picks_first_match() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert_eq!(find_summary(temp.path()).expect("find"), None);

        fs::write(temp.path().join("notes.json"), "{}").expect("seed");
        write_summary(temp.path(), &sample("beta")).expect("write");
        write_summary(temp.path(), &sample("alpha")).expect("write");
        assert_eq!(
            find_summary(temp.path()).expect("find"),
            Some(temp.path().join("alpha_generation_summary.json"))
        );
    }
}
