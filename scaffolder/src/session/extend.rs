use std::collections::BTreeSet;
use std::time::Instant;

use anyhow::Result;
use tracing::{info, instrument};

use crate::core::completion::CompletionPhrases;
use crate::core::results::FeatureResult;
use crate::dispatch::ToolDispatcher;
use crate::io::prompt::{FEATURE_CONTINUE_PROMPT, FEATURE_SUMMARY_PROMPT, FeaturePrompt, PromptEngine};
use crate::io::provider::ChatProvider;
use crate::looping::{LoopConfig, run_loop};
use crate::session::SessionReport;

/// Inputs of a feature addition session.
#[derive(Debug, Clone)]
pub struct FeatureRequest {
    pub project_name: String,
    pub project_type: String,
    pub feature_description: String,
    /// Files known to exist before the session, relative to the project root.
    pub known_files: Vec<String>,
    pub known_directories: Vec<String>,
    pub model: String,
    pub max_steps: u32,
}

/// Add a feature to the project in the dispatcher's root.
///
/// Writes are classified against `known_files`: an overwrite of an unknown
/// file is new, everything else is a modification.
#[instrument(skip_all, fields(project = %request.project_name, max_steps = request.max_steps))]
pub fn add_feature<P, F>(
    provider: &P,
    dispatcher: &ToolDispatcher,
    prompts: &PromptEngine,
    request: &FeatureRequest,
    on_progress: F,
) -> Result<SessionReport<FeatureResult>>
where
    P: ChatProvider,
    F: FnMut(u32, u32, &str),
{
    let seed = prompts.feature_messages(&FeaturePrompt {
        project_name: &request.project_name,
        project_type: &request.project_type,
        feature_description: &request.feature_description,
        files: &request.known_files,
        directories: &request.known_directories,
    })?;
    let known_files: BTreeSet<String> = request.known_files.iter().cloned().collect();
    let config = LoopConfig {
        model: &request.model,
        max_steps: request.max_steps,
        completion: CompletionPhrases::FeatureAddition,
        continue_prompt: FEATURE_CONTINUE_PROMPT,
        summary_prompt: FEATURE_SUMMARY_PROMPT,
        known_files: &known_files,
    };

    let started = Instant::now();
    let outcome = run_loop(provider, dispatcher, &config, seed, on_progress);
    let elapsed = started.elapsed().as_secs_f64();

    let changes = outcome.state.file_changes(&known_files);
    let new_directories = outcome.state.directories.clone();
    info!(
        steps = outcome.steps,
        new_files = changes.new_files.len(),
        modified_files = changes.modified_files.len(),
        elapsed_secs = elapsed,
        "feature session finished"
    );

    Ok(SessionReport {
        result: FeatureResult {
            project_name: request.project_name.clone(),
            project_type: request.project_type.clone(),
            feature_description: request.feature_description.clone(),
            total_steps: outcome.steps,
            total_new_files: changes.new_files.len(),
            total_modified_files: changes.modified_files.len(),
            total_new_directories: new_directories.len(),
            new_files: changes.new_files,
            modified_files: changes.modified_files,
            new_directories,
            feature_addition_time_seconds: elapsed,
            summary: outcome.summary,
            actions: outcome.state.actions,
        },
        stop: outcome.stop,
    })
}
