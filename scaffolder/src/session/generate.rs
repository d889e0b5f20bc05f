use std::collections::BTreeSet;
use std::time::Instant;

use anyhow::Result;
use tracing::{info, instrument};

use crate::core::completion::CompletionPhrases;
use crate::core::features::FeatureSelection;
use crate::core::results::GenerationResult;
use crate::dispatch::ToolDispatcher;
use crate::io::prompt::{
    GENERATION_CONTINUE_PROMPT, GENERATION_SUMMARY_PROMPT, GenerationPrompt, PromptEngine,
};
use crate::io::provider::ChatProvider;
use crate::looping::{LoopConfig, run_loop};
use crate::session::SessionReport;

/// Inputs of a project generation session.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub project_name: String,
    pub project_type: String,
    pub description: String,
    pub features: FeatureSelection,
    pub model: String,
    pub max_steps: u32,
}

/// Generate a project from scratch in the dispatcher's root.
///
/// Budget exhaustion and provider failure still yield a result built from
/// whatever the loop accomplished; only prompt rendering can fail here.
#[instrument(skip_all, fields(project = %request.project_name, max_steps = request.max_steps))]
pub fn generate_project<P, F>(
    provider: &P,
    dispatcher: &ToolDispatcher,
    prompts: &PromptEngine,
    request: &GenerationRequest,
    on_progress: F,
) -> Result<SessionReport<GenerationResult>>
where
    P: ChatProvider,
    F: FnMut(u32, u32, &str),
{
    let seed = prompts.generation_messages(&GenerationPrompt {
        project_name: &request.project_name,
        project_type: &request.project_type,
        description: &request.description,
        features: request.features,
    })?;
    let known_files = BTreeSet::new();
    let config = LoopConfig {
        model: &request.model,
        max_steps: request.max_steps,
        completion: CompletionPhrases::Generation,
        continue_prompt: GENERATION_CONTINUE_PROMPT,
        summary_prompt: GENERATION_SUMMARY_PROMPT,
        known_files: &known_files,
    };

    let started = Instant::now();
    let outcome = run_loop(provider, dispatcher, &config, seed, on_progress);
    let elapsed = started.elapsed().as_secs_f64();

    let files_created = outcome.state.written_files();
    let directories_created = outcome.state.directories.clone();
    info!(
        steps = outcome.steps,
        files = files_created.len(),
        directories = directories_created.len(),
        elapsed_secs = elapsed,
        "generation session finished"
    );

    Ok(SessionReport {
        result: GenerationResult {
            project_name: request.project_name.clone(),
            project_type: request.project_type.clone(),
            total_steps: outcome.steps,
            total_files: files_created.len(),
            total_directories: directories_created.len(),
            files_created,
            directories_created,
            generation_time_seconds: elapsed,
            summary: outcome.summary,
            features: request.features,
            actions: outcome.state.actions,
        },
        stop: outcome.stop,
    })
}
