//! Transcript and tool-result types exchanged between the loop and its collaborators.
//!
//! These types define stable contracts between core components. Everything that
//! ends up in the action log or a persisted summary derives `Serialize` and
//! `Deserialize` so a summary file can be loaded back for feature addition.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Speaker of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A model-issued request to invoke one of the catalog tools.
///
/// `name` is kept verbatim as sent by the model so the transcript can be
/// replayed unchanged; the typed form is produced by
/// [`ToolInvocation::parse`](crate::core::catalog::ToolInvocation::parse).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Option<String>,
    /// Non-empty only on assistant turns that request tools.
    pub tool_calls: Vec<ToolCallRequest>,
    /// Set only on tool messages; correlates with [`ToolCallRequest::id`].
    pub tool_call_id: Option<String>,
}

impl Message {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    pub fn assistant_tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    pub fn text_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Listing produced by `list_directory_contents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryListing {
    pub files: Vec<String>,
    pub directories: Vec<String>,
    pub total_files: usize,
    pub total_directories: usize,
}

/// Metadata produced by `get_file_metadata`, with timestamps already rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub name: String,
    pub size: u64,
    pub created: String,
    pub modified: String,
    pub accessed: String,
    pub permissions: String,
    pub is_directory: bool,
    pub is_file: bool,
    pub absolute_path: String,
}

/// Captured result of `run_command`. A non-zero exit code is data, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub returncode: Option<i32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub timed_out: bool,
}

/// Payload returned to the model for a tool call.
///
/// Failures of any kind surface as [`ToolResult::Null`] (read, metadata, list,
/// command) or `{"success": false}` (write, mkdir).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResult {
    Null,
    Content(String),
    Listing(DirectoryListing),
    Metadata(MetadataRecord),
    Command(CommandResult),
    Success { success: bool },
}

impl ToolResult {
    pub fn success(ok: bool) -> Self {
        ToolResult::Success { success: ok }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ToolResult::Null | ToolResult::Success { success: false }
        )
    }

    /// JSON text embedded in the tool message of the transcript.
    pub fn to_transcript_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }
}

/// One entry of the append-only action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionRecord {
    Tool {
        step: u32,
        action: String,
        args: Map<String, Value>,
        result: ToolResult,
    },
    Error {
        step: u32,
        error: String,
    },
}

impl ActionRecord {
    pub fn step(&self) -> u32 {
        match self {
            ActionRecord::Tool { step, .. } | ActionRecord::Error { step, .. } => *step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_result_serializes_as_json_null() {
        assert_eq!(ToolResult::Null.to_transcript_text(), "null");
    }

    #[test]
    fn success_result_serializes_as_flag_object() {
        assert_eq!(
            ToolResult::success(false).to_transcript_text(),
            r#"{"success":false}"#
        );
    }

    #[test]
    fn command_result_omits_timed_out_unless_set() {
        let result = ToolResult::Command(CommandResult {
            stdout: "hi\n".to_string(),
            stderr: String::new(),
            returncode: Some(0),
            timed_out: false,
        });
        let value: Value = serde_json::from_str(&result.to_transcript_text()).expect("json");
        assert_eq!(value, json!({"stdout": "hi\n", "stderr": "", "returncode": 0}));
    }

    #[test]
    fn action_log_round_trips_through_json() {
        let mut args = Map::new();
        args.insert("filename".to_string(), json!("a/b.txt"));
        let actions = vec![
            ActionRecord::Tool {
                step: 1,
                action: "read_file".to_string(),
                args,
                result: ToolResult::Content("x".to_string()),
            },
            ActionRecord::Tool {
                step: 1,
                action: "create_directory".to_string(),
                args: Map::new(),
                result: ToolResult::success(true),
            },
            ActionRecord::Error {
                step: 2,
                error: "connection reset".to_string(),
            },
        ];

        let raw = serde_json::to_string(&actions).expect("serialize");
        let loaded: Vec<ActionRecord> = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(loaded, actions);
        assert_eq!(loaded[2].step(), 2);
    }
}
