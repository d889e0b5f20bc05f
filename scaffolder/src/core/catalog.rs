//! The fixed tool catalog advertised to the model, and typed decoding of tool calls.
//!
//! Adding a tool means extending [`ToolName`], its schema in
//! [`ToolName::parameters`], and the [`ToolInvocation`] enum; the dispatcher's
//! exhaustive `match` then points at the missing arm.

use std::fmt;

use anyhow::{Result, anyhow, bail};
use jsonschema::validator_for;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Every tool the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    ReadFile,
    GetFileMetadata,
    ListDirectoryContents,
    WriteToFile,
    RunCommand,
    CreateDirectory,
}

impl ToolName {
    pub const ALL: [ToolName; 6] = [
        ToolName::ReadFile,
        ToolName::GetFileMetadata,
        ToolName::ListDirectoryContents,
        ToolName::WriteToFile,
        ToolName::RunCommand,
        ToolName::CreateDirectory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ReadFile => "read_file",
            ToolName::GetFileMetadata => "get_file_metadata",
            ToolName::ListDirectoryContents => "list_directory_contents",
            ToolName::WriteToFile => "write_to_file",
            ToolName::RunCommand => "run_command",
            ToolName::CreateDirectory => "create_directory",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::ReadFile => "Reads contents of a file in the current working directory",
            ToolName::GetFileMetadata => {
                "Returns metadata for a file in the current working directory"
            }
            ToolName::ListDirectoryContents => {
                "Lists all files and directories in the specified directory"
            }
            ToolName::WriteToFile => "Writes content to a file in the current working directory",
            ToolName::RunCommand => {
                "Runs a terminal command in the current working directory, without sudo"
            }
            ToolName::CreateDirectory => "Creates a directory in the current working directory",
        }
    }

    /// JSON Schema of the tool's arguments, exactly as advertised to the model.
    pub fn parameters(&self) -> Value {
        match self {
            ToolName::ReadFile => json!({
                "type": "object",
                "properties": {
                    "filename": {
                        "type": "string",
                        "description": "Name of the file to read"
                    }
                },
                "required": ["filename"]
            }),
            ToolName::GetFileMetadata => json!({
                "type": "object",
                "properties": {
                    "filename": {
                        "type": "string",
                        "description": "Name of the file to get metadata for"
                    }
                },
                "required": ["filename"]
            }),
            ToolName::ListDirectoryContents => json!({
                "type": "object",
                "properties": {
                    "directory": {
                        "type": "string",
                        "description": "Directory to list contents from (defaults to current directory)"
                    }
                }
            }),
            ToolName::WriteToFile => json!({
                "type": "object",
                "properties": {
                    "filename": {
                        "type": "string",
                        "description": "Name of the file to write to"
                    },
                    "content": {
                        "type": "string",
                        "description": "Content to write to the file"
                    },
                    "mode": {
                        "type": "string",
                        "description": "Write mode ('w' for overwrite, 'a' for append)",
                        "enum": ["w", "a"]
                    }
                },
                "required": ["filename", "content"]
            }),
            ToolName::RunCommand => json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "Command to run"
                    }
                },
                "required": ["command"]
            }),
            ToolName::CreateDirectory => json!({
                "type": "object",
                "properties": {
                    "directory_name": {
                        "type": "string",
                        "description": "Name of directory to create"
                    }
                },
                "required": ["directory_name"]
            }),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: ToolFunction {
                name: self.as_str().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters(),
            },
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool definition in the provider's function-calling format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: ToolFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// The full catalog, in a stable order.
pub fn tool_catalog() -> Vec<ToolDefinition> {
    ToolName::ALL.iter().map(ToolName::definition).collect()
}

/// `write_to_file` mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    #[default]
    #[serde(rename = "w")]
    Overwrite,
    #[serde(rename = "a")]
    Append,
}

fn current_dir() -> String {
    ".".to_string()
}

/// A validated, typed tool call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolInvocation {
    ReadFile {
        filename: String,
    },
    GetFileMetadata {
        filename: String,
    },
    ListDirectoryContents {
        #[serde(default = "current_dir")]
        directory: String,
    },
    WriteToFile {
        filename: String,
        content: String,
        #[serde(default)]
        mode: WriteMode,
    },
    RunCommand {
        command: String,
    },
    CreateDirectory {
        directory_name: String,
    },
}

impl ToolInvocation {
    /// Decode a raw tool call.
    ///
    /// Fails on an unknown tool name or arguments that do not satisfy the
    /// advertised parameter schema.
    pub fn parse(name: &str, arguments: &Map<String, Value>) -> Result<Self> {
        let tool = ToolName::from_name(name).ok_or_else(|| anyhow!("unknown tool {name:?}"))?;
        let instance = Value::Object(arguments.clone());
        validate_arguments(tool, &instance)?;

        let mut tagged = arguments.clone();
        tagged.insert("tool".to_string(), Value::String(tool.as_str().to_string()));
        serde_json::from_value(Value::Object(tagged))
            .map_err(|err| anyhow!("decode {tool} arguments: {err}"))
    }

    pub fn tool(&self) -> ToolName {
        match self {
            ToolInvocation::ReadFile { .. } => ToolName::ReadFile,
            ToolInvocation::GetFileMetadata { .. } => ToolName::GetFileMetadata,
            ToolInvocation::ListDirectoryContents { .. } => ToolName::ListDirectoryContents,
            ToolInvocation::WriteToFile { .. } => ToolName::WriteToFile,
            ToolInvocation::RunCommand { .. } => ToolName::RunCommand,
            ToolInvocation::CreateDirectory { .. } => ToolName::CreateDirectory,
        }
    }
}

fn validate_arguments(tool: ToolName, instance: &Value) -> Result<()> {
    let schema = tool.parameters();
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid {tool} schema: {err}"))?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("{tool} arguments rejected: {}", messages.join("; "));
    }
    Ok(())
}
