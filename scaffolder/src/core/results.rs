//! Caller-facing summaries of a finished session.

use serde::{Deserialize, Serialize};

use crate::core::features::FeatureSelection;
use crate::core::types::ActionRecord;

/// Outcome of a project generation session; persisted as the generation summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub project_name: String,
    pub project_type: String,
    pub total_steps: u32,
    pub total_files: usize,
    pub total_directories: usize,
    pub files_created: Vec<String>,
    pub directories_created: Vec<String>,
    pub generation_time_seconds: f64,
    pub summary: String,
    pub features: FeatureSelection,
    pub actions: Vec<ActionRecord>,
}

/// Outcome of a feature addition session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureResult {
    pub project_name: String,
    pub project_type: String,
    pub feature_description: String,
    pub total_steps: u32,
    pub total_new_files: usize,
    pub total_modified_files: usize,
    pub total_new_directories: usize,
    pub new_files: Vec<String>,
    pub modified_files: Vec<String>,
    pub new_directories: Vec<String>,
    pub feature_addition_time_seconds: f64,
    pub summary: String,
    pub actions: Vec<ActionRecord>,
}
