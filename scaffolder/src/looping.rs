//! The bounded agent loop and its best-effort summary stage.

use std::collections::BTreeSet;

use tracing::{info, instrument, warn};

use crate::core::budget::StepBudget;
use crate::core::catalog::tool_catalog;
use crate::core::completion::CompletionPhrases;
use crate::core::state::LoopState;
use crate::core::types::Message;
use crate::dispatch::ToolDispatcher;
use crate::io::provider::{ChatProvider, ChatRequest};
use crate::step::{StepContext, StepOutcome, run_step};

/// Per-use-case settings of one loop invocation.
#[derive(Debug, Clone)]
pub struct LoopConfig<'a> {
    pub model: &'a str,
    pub max_steps: u32,
    pub completion: CompletionPhrases,
    /// User message appended after a text turn that did not finish the session.
    pub continue_prompt: &'a str,
    /// User message that requests the final free-text summary.
    pub summary_prompt: &'a str,
    pub known_files: &'a BTreeSet<String>,
}

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStop {
    /// The model emitted a completion phrase.
    Complete,
    /// `max_steps` model turns ran without completion.
    BudgetExhausted { max_steps: u32 },
    /// A provider call failed mid-loop.
    Failed { error: String },
}

/// Everything a loop invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome {
    pub stop: LoopStop,
    /// Number of steps started, including a failed one.
    pub steps: u32,
    pub state: LoopState,
    /// Free-text summary; empty when the summary call failed.
    pub summary: String,
}

/// Run steps until completion, budget exhaustion or a provider failure, then
/// fetch the summary.
///
/// `on_progress(step, max_steps, message)` is called synchronously from this
/// thread. Partial results are always returned.
#[instrument(skip_all, fields(model = config.model, max_steps = config.max_steps))]
pub fn run_loop<P, F>(
    provider: &P,
    dispatcher: &ToolDispatcher,
    config: &LoopConfig<'_>,
    seed: Vec<Message>,
    mut on_progress: F,
) -> LoopOutcome
where
    P: ChatProvider,
    F: FnMut(u32, u32, &str),
{
    let tools = tool_catalog();
    let ctx = StepContext {
        provider,
        dispatcher,
        model: config.model,
        tools: &tools,
        completion: config.completion,
        continue_prompt: config.continue_prompt,
        known_files: config.known_files,
        max_steps: config.max_steps,
    };
    let budget = StepBudget::new(config.max_steps);
    let mut state = LoopState::new(seed);

    let stop = loop {
        let Some(step) = budget.admit(state.step) else {
            warn!(max_steps = budget.max_steps(), "step budget exhausted");
            break LoopStop::BudgetExhausted {
                max_steps: budget.max_steps(),
            };
        };
        state.step = step;
        on_progress(step, config.max_steps, "Processing...");

        let (next, outcome) = run_step(state, &ctx, &mut on_progress);
        state = next;
        match outcome {
            StepOutcome::ToolsExecuted { .. } | StepOutcome::Continue => {}
            StepOutcome::Complete => break LoopStop::Complete,
            StepOutcome::Failed { error } => break LoopStop::Failed { error },
        }
    };
    info!(steps = state.step, stop = ?stop, "loop finished");

    let summary = fetch_summary(provider, config.model, &mut state, config.summary_prompt);
    LoopOutcome {
        stop,
        steps: state.step,
        state,
        summary,
    }
}

/// Ask for a free-text summary without tools.
///
/// Isolated from the loop result: a failure is logged and yields an empty
/// summary.
pub fn fetch_summary<P: ChatProvider>(
    provider: &P,
    model: &str,
    state: &mut LoopState,
    prompt: &str,
) -> String {
    state.push(Message::user(prompt));
    match provider.complete(&ChatRequest::text_only(model, &state.transcript)) {
        Ok(reply) => {
            let summary = reply.text_or_empty().to_string();
            state.push(reply);
            summary
        }
        Err(err) => {
            warn!(err = %format!("{err:#}"), "summary call failed");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ActionRecord, Role};
    use crate::test_support::{ScriptedProvider, TestProject, call, failure, text, tools};
    use serde_json::json;

    fn config(known: &BTreeSet<String>, max_steps: u32) -> LoopConfig<'_> {
        LoopConfig {
            model: "test-model",
            max_steps,
            completion: CompletionPhrases::Generation,
            continue_prompt: "continue",
            summary_prompt: "summarize",
            known_files: known,
        }
    }

    fn seed() -> Vec<Message> {
        vec![Message::system("sys"), Message::user("task")]
    }

    #[test]
    fn stops_on_completion_and_fetches_summary_once() {
        let project = TestProject::new().expect("project");
        let known = BTreeSet::new();
        let provider = ScriptedProvider::new(vec![
            text("planning"),
            tools(vec![call("c1", "create_directory", json!({"directory_name": "src"}))]),
            text("Project generation is complete."),
            text("Made a src directory."),
        ]);

        let outcome = run_loop(&provider, project.dispatcher(), &config(&known, 25), seed(), |_, _, _| {});

        assert_eq!(outcome.stop, LoopStop::Complete);
        assert_eq!(outcome.steps, 3);
        assert_eq!(outcome.summary, "Made a src directory.");
        let requests = provider.requests();
        assert_eq!(requests.len(), 4);
        assert!(requests[..3].iter().all(|r| r.with_tools));
        assert!(!requests[3].with_tools);
        let last = requests[3].messages.last().expect("message");
        assert_eq!((last.role, last.text_or_empty()), (Role::User, "summarize"));
    }

    #[test]
    fn budget_exhaustion_still_fetches_summary() {
        let project = TestProject::new().expect("project");
        let known = BTreeSet::new();
        let mut replies: Vec<_> = (0..5).map(|_| text("still going")).collect();
        replies.push(text("partial summary"));
        let provider = ScriptedProvider::new(replies);

        let mut progress = Vec::new();
        let outcome = run_loop(
            &provider,
            project.dispatcher(),
            &config(&known, 5),
            seed(),
            |step, max, msg| progress.push((step, max, msg.to_string())),
        );

        assert_eq!(outcome.stop, LoopStop::BudgetExhausted { max_steps: 5 });
        assert_eq!(outcome.steps, 5);
        assert_eq!(outcome.summary, "partial summary");
        assert_eq!(provider.requests().len(), 6);
        let starts: Vec<u32> = progress
            .iter()
            .filter(|(_, _, msg)| msg == "Processing...")
            .map(|(step, _, _)| *step)
            .collect();
        assert_eq!(starts, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn provider_failure_keeps_partial_results() {
        let project = TestProject::new().expect("project");
        let known = BTreeSet::new();
        let provider = ScriptedProvider::new(vec![
            tools(vec![call("c1", "write_to_file", json!({"filename": "a.txt", "content": "a"}))]),
            failure("connection reset"),
            text("summary after failure"),
        ]);

        let outcome = run_loop(&provider, project.dispatcher(), &config(&known, 25), seed(), |_, _, _| {});

        assert_eq!(
            outcome.stop,
            LoopStop::Failed {
                error: "connection reset".to_string()
            }
        );
        assert_eq!(outcome.steps, 2);
        assert_eq!(outcome.state.written_files(), vec!["a.txt"]);
        assert_eq!(outcome.state.actions.len(), 2);
        assert!(matches!(
            &outcome.state.actions[1],
            ActionRecord::Error { step: 2, error } if error == "connection reset"
        ));
        assert_eq!(outcome.summary, "summary after failure");
    }

    #[test]
    fn failed_summary_call_yields_empty_summary() {
        let project = TestProject::new().expect("project");
        let known = BTreeSet::new();
        let provider = ScriptedProvider::new(vec![
            tools(vec![call("c1", "create_directory", json!({"directory_name": "docs"}))]),
            text("project generation is complete"),
            failure("timeout"),
        ]);

        let outcome = run_loop(&provider, project.dispatcher(), &config(&known, 25), seed(), |_, _, _| {});

        assert_eq!(outcome.stop, LoopStop::Complete);
        assert_eq!(outcome.summary, "");
        assert_eq!(outcome.state.directories, vec!["docs"]);
        assert_eq!(outcome.state.actions.len(), 1);
    }
}
