//! Chat-completion provider abstraction.
//!
//! The [`ChatProvider`] trait decouples the agent loop from the HTTP backend.
//! Tests use scripted providers that return predetermined replies.

use anyhow::Result;

use crate::core::catalog::ToolDefinition;
use crate::core::types::Message;

/// One chat-completion request.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    /// Tools offered to the model; `None` for a text-only call.
    pub tools: Option<&'a [ToolDefinition]>,
}

impl<'a> ChatRequest<'a> {
    /// A request offering `tools` with the model free to choose (`tool_choice: auto`).
    pub fn with_tools(model: &'a str, messages: &'a [Message], tools: &'a [ToolDefinition]) -> Self {
        Self {
            model,
            messages,
            tools: Some(tools),
        }
    }

    pub fn text_only(model: &'a str, messages: &'a [Message]) -> Self {
        Self {
            model,
            messages,
            tools: None,
        }
    }
}

/// Abstraction over chat-completion backends.
pub trait ChatProvider {
    /// Send the transcript and return the assistant reply.
    ///
    /// The reply carries either tool calls or text content. Transport and
    /// protocol failures are errors.
    fn complete(&self, request: &ChatRequest<'_>) -> Result<Message>;
}

impl<P: ChatProvider + ?Sized> ChatProvider for &P {
    fn complete(&self, request: &ChatRequest<'_>) -> Result<Message> {
        (**self).complete(request)
    }
}
