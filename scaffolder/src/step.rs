//! One iteration of the agent loop: a model turn and its tool calls.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::core::catalog::{ToolDefinition, ToolInvocation};
use crate::core::classifier::FileChange;
use crate::core::completion::CompletionPhrases;
use crate::core::state::LoopState;
use crate::core::types::{ActionRecord, Message};
use crate::dispatch::ToolDispatcher;
use crate::io::provider::{ChatProvider, ChatRequest};

/// Collaborators and settings shared by every step of one loop.
pub struct StepContext<'a, P> {
    pub provider: &'a P,
    pub dispatcher: &'a ToolDispatcher,
    pub model: &'a str,
    pub tools: &'a [ToolDefinition],
    pub completion: CompletionPhrases,
    pub continue_prompt: &'a str,
    /// Files that existed before the session; decides new vs modified.
    pub known_files: &'a BTreeSet<String>,
    pub max_steps: u32,
}

/// What a step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The model requested tools; all of them ran.
    ToolsExecuted { calls: usize },
    /// The model replied with text that did not finish the session.
    Continue,
    /// The model declared the session finished.
    Complete,
    /// The provider call failed.
    Failed { error: String },
}

/// Execute step `state.step`: call the model, then run its tool calls in order.
///
/// Takes the loop state by value and hands it back with the outcome. Every
/// tool call gets exactly one tool message and one action record, even when
/// the call failed. A provider failure is recorded in the action log and
/// returned as [`StepOutcome::Failed`].
pub fn run_step<P, F>(
    mut state: LoopState,
    ctx: &StepContext<'_, P>,
    on_progress: &mut F,
) -> (LoopState, StepOutcome)
where
    P: ChatProvider,
    F: FnMut(u32, u32, &str),
{
    let step = state.step;
    let request = ChatRequest::with_tools(ctx.model, &state.transcript, ctx.tools);
    let reply = match ctx.provider.complete(&request) {
        Ok(reply) => reply,
        Err(err) => {
            let error = format!("{err:#}");
            warn!(step, err = %error, "provider call failed");
            state.actions.push(ActionRecord::Error {
                step,
                error: error.clone(),
            });
            return (state, StepOutcome::Failed { error });
        }
    };

    if reply.has_tool_calls() {
        let calls = reply.tool_calls.clone();
        state.push(reply);
        on_progress(step, ctx.max_steps, &format!("Processing {} tool calls", calls.len()));

        for call in &calls {
            let dispatched = ctx.dispatcher.dispatch(call);
            if let Some(invocation) = &dispatched.invocation {
                let succeeded = !dispatched.result.is_failure();
                if let Some(message) =
                    track_invocation(&mut state, ctx.known_files, invocation, succeeded)
                {
                    on_progress(step, ctx.max_steps, &message);
                }
            }
            state.actions.push(ActionRecord::Tool {
                step,
                action: call.name.clone(),
                args: call.arguments.clone(),
                result: dispatched.result.clone(),
            });
            state.push(Message::tool(
                call.id.clone(),
                dispatched.result.to_transcript_text(),
            ));
        }
        debug!(step, calls = calls.len(), "tool turn finished");
        let outcome = StepOutcome::ToolsExecuted { calls: calls.len() };
        return (state, outcome);
    }

    let text = reply.text_or_empty().to_string();
    state.push(reply);
    on_progress(step, ctx.max_steps, "Processing assistant message");

    if ctx.completion.is_complete(&text) {
        info!(step, "model declared completion");
        on_progress(ctx.max_steps, ctx.max_steps, ctx.completion.finished_message());
        (state, StepOutcome::Complete)
    } else {
        state.push(Message::user(ctx.continue_prompt));
        (state, StepOutcome::Continue)
    }
}

/// Record file-system effects of a call and return its progress line, if any.
fn track_invocation(
    state: &mut LoopState,
    known_files: &BTreeSet<String>,
    invocation: &ToolInvocation,
    succeeded: bool,
) -> Option<String> {
    match invocation {
        ToolInvocation::WriteToFile { filename, mode, .. } if succeeded => {
            match state.record_write(filename, *mode, known_files) {
                FileChange::New => Some(format!("Created file: {filename}")),
                FileChange::Modified => Some(format!("Modified file: {filename}")),
            }
        }
        ToolInvocation::CreateDirectory { directory_name } if succeeded => {
            state.record_directory(directory_name);
            Some(format!("Created directory: {directory_name}"))
        }
        ToolInvocation::ReadFile { filename } => Some(format!("Analyzing file: {filename}")),
        _ => None,
    }
}
