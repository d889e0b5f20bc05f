//! Test-only helpers: a scripted chat provider and a throwaway project directory.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde_json::Value;
use tempfile::TempDir;

use crate::core::types::{Message, ToolCallRequest};
use crate::dispatch::ToolDispatcher;
use crate::io::command::CommandRunner;
use crate::io::provider::{ChatProvider, ChatRequest};
use crate::io::sandbox::SandboxedFileStore;

/// Snapshot of one request received by [`ScriptedProvider`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub with_tools: bool,
}

/// Provider that replays predetermined replies in order and records every request.
///
/// Once the script runs out, further calls fail.
pub struct ScriptedProvider {
    replies: RefCell<VecDeque<Result<Message>>>,
    requests: RefCell<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<Message>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }
}

impl ChatProvider for ScriptedProvider {
    fn complete(&self, request: &ChatRequest<'_>) -> Result<Message> {
        self.requests.borrow_mut().push(RecordedRequest {
            model: request.model.to_string(),
            messages: request.messages.to_vec(),
            with_tools: request.tools.is_some(),
        });
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("scripted provider has no replies left")))
    }
}

/// Assistant reply with plain text.
pub fn text(content: &str) -> Result<Message> {
    Ok(Message::assistant(content))
}

/// Assistant reply requesting tools.
pub fn tools(calls: Vec<ToolCallRequest>) -> Result<Message> {
    Ok(Message::assistant_tool_calls(calls))
}

/// Provider failure with the given message.
pub fn failure(message: &str) -> Result<Message> {
    Err(anyhow!("{message}"))
}

/// Tool call with JSON object arguments. Non-object arguments become empty.
pub fn call(id: &str, name: &str, arguments: Value) -> ToolCallRequest {
    let arguments = match arguments {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    ToolCallRequest::new(id, name, arguments)
}

/// Temporary project directory nested one level inside a temp dir, with a dispatcher.
///
/// The nesting leaves room to assert that nothing escapes into the parent.
pub struct TestProject {
    temp: TempDir,
    dispatcher: ToolDispatcher,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join("project");
        std::fs::create_dir_all(&root)?;
        let files = SandboxedFileStore::new(&root)?;
        let commands = CommandRunner::new(files.root(), Duration::from_secs(10), 10_000);
        Ok(Self {
            temp,
            dispatcher: ToolDispatcher::new(files, commands),
        })
    }

    pub fn root(&self) -> &Path {
        self.dispatcher.files().root()
    }

    /// Directory containing the project root.
    pub fn parent(&self) -> &Path {
        self.temp.path()
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }
}
