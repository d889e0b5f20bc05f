//! Routes model tool calls to the file store and command runner.

use tracing::{debug, instrument, warn};

use crate::core::catalog::ToolInvocation;
use crate::core::types::{MetadataRecord, ToolCallRequest, ToolResult};
use crate::io::command::CommandRunner;
use crate::io::sandbox::{FileMetadata, SandboxedFileStore};

/// Timestamp rendering used in `get_file_metadata` results.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Result of one dispatched call.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// The decoded call, or `None` when the name or arguments were invalid.
    pub invocation: Option<ToolInvocation>,
    pub result: ToolResult,
}

/// Executes tool calls against one project directory.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    files: SandboxedFileStore,
    commands: CommandRunner,
}

impl ToolDispatcher {
    pub fn new(files: SandboxedFileStore, commands: CommandRunner) -> Self {
        Self { files, commands }
    }

    pub fn files(&self) -> &SandboxedFileStore {
        &self.files
    }

    /// Decode and execute a raw call. Never fails: problems become a failure result.
    #[instrument(skip_all, fields(tool = %call.name, id = %call.id))]
    pub fn dispatch(&self, call: &ToolCallRequest) -> Dispatched {
        match ToolInvocation::parse(&call.name, &call.arguments) {
            Ok(invocation) => {
                let result = self.invoke(&invocation);
                Dispatched {
                    invocation: Some(invocation),
                    result,
                }
            }
            Err(err) => {
                warn!(err = %err, "tool call not dispatched");
                Dispatched {
                    invocation: None,
                    result: ToolResult::Null,
                }
            }
        }
    }

    pub fn invoke(&self, invocation: &ToolInvocation) -> ToolResult {
        let result = match invocation {
            ToolInvocation::ReadFile { filename } => self
                .files
                .read(filename)
                .map_or(ToolResult::Null, ToolResult::Content),
            ToolInvocation::GetFileMetadata { filename } => self
                .files
                .metadata(filename)
                .map_or(ToolResult::Null, |meta| {
                    ToolResult::Metadata(metadata_record(meta))
                }),
            ToolInvocation::ListDirectoryContents { directory } => self
                .files
                .list(directory)
                .map_or(ToolResult::Null, ToolResult::Listing),
            ToolInvocation::WriteToFile {
                filename,
                content,
                mode,
            } => ToolResult::success(self.files.write(filename, content, *mode).is_ok()),
            ToolInvocation::RunCommand { command } => self
                .commands
                .run(command)
                .map_or(ToolResult::Null, ToolResult::Command),
            ToolInvocation::CreateDirectory { directory_name } => {
                ToolResult::success(self.files.mkdir(directory_name).is_ok())
            }
        };
        debug!(tool = %invocation.tool(), failed = result.is_failure(), "tool call finished");
        result
    }
}

fn metadata_record(meta: FileMetadata) -> MetadataRecord {
    MetadataRecord {
        name: meta.name,
        size: meta.size,
        created: meta.created.format(TIMESTAMP_FORMAT).to_string(),
        modified: meta.modified.format(TIMESTAMP_FORMAT).to_string(),
        accessed: meta.accessed.format(TIMESTAMP_FORMAT).to_string(),
        permissions: meta.permissions,
        is_directory: meta.is_dir,
        is_file: meta.is_file,
        absolute_path: meta.absolute_path.to_string_lossy().into_owned(),
    }
}
