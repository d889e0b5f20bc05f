//! Shell command execution inside the project directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::core::command_policy;
use crate::core::types::CommandResult;
use crate::io::process::run_command_with_timeout;

/// Why a command produced no result.
#[derive(Debug)]
pub enum CommandError {
    /// Denied by the command policy; nothing was spawned.
    Rejected { command: String },
    /// The shell could not be spawned or waited on.
    Failed {
        command: String,
        source: anyhow::Error,
    },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Rejected { command } => {
                write!(f, "command rejected by policy: {command}")
            }
            CommandError::Failed { command, source } => {
                write!(f, "command failed to run: {command}: {source:#}")
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// Runs shell commands with the project root as working directory.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    root: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandRunner {
    pub fn new(root: &Path, timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            root: root.to_path_buf(),
            timeout,
            output_limit_bytes,
        }
    }

    /// Run `command` through the platform shell and capture its output.
    ///
    /// A non-zero exit status is returned as data in [`CommandResult`].
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn run(&self, command: &str) -> Result<CommandResult, CommandError> {
        if !command_policy::is_allowed(command) {
            warn!(command, "command rejected by policy");
            return Err(CommandError::Rejected {
                command: command.to_string(),
            });
        }

        let mut cmd = shell(command);
        cmd.current_dir(&self.root);
        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes)
            .map_err(|source| {
                warn!(command, err = %source, "command failed to run");
                CommandError::Failed {
                    command: command.to_string(),
                    source,
                }
            })?;

        info!(command, exit_code = ?output.status.code(), timed_out = output.timed_out, "ran command");
        Ok(CommandResult {
            stdout: output.stdout_text(),
            stderr: output.stderr_text(),
            returncode: output.status.code(),
            timed_out: output.timed_out,
        })
    }
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(not(unix))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn runner(root: &Path) -> CommandRunner {
        CommandRunner::new(root, Duration::from_secs(10), 1024)
    }

    #[test]
    fn runs_in_project_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("marker.txt"), "here").expect("seed");
        let result = runner(temp.path()).run("cat marker.txt").expect("run");
        assert_eq!(result.stdout, "here");
        assert_eq!(result.returncode, Some(0));
    }

    #[test]
    fn non_zero_exit_is_data() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = runner(temp.path())
            .run("echo broken >&2; exit 7")
            .expect("run");
        assert_eq!(result.stderr, "broken\n");
        assert_eq!(result.returncode, Some(7));
        assert!(!result.timed_out);
    }

    #[test]
    fn sudo_is_rejected_before_spawning() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = runner(temp.path())
            .run("touch created && sudo true")
            .unwrap_err();
        assert!(matches!(err, CommandError::Rejected { .. }));
        assert!(!temp.path().join("created").exists());
    }

    #[test]
    fn timeout_kills_and_flags_result() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = CommandRunner::new(temp.path(), Duration::from_millis(300), 1024);
        let started = Instant::now();
        let result = runner.run("sleep 4; echo done").expect("run");
        assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
        assert!(result.timed_out);
        assert_eq!(result.returncode, None);
        assert_eq!(result.stdout, "");
    }

    #[test]
    fn background_job_does_not_hold_the_session() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = CommandRunner::new(temp.path(), Duration::from_millis(300), 1024);
        let started = Instant::now();
        let result = runner.run("sleep 4 & echo started").expect("run");
        assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
        assert!(!result.timed_out);
        assert_eq!(result.returncode, Some(0));
        assert_eq!(result.stdout, "started\n");
    }

    #[test]
    fn oversized_output_is_truncated_with_notice() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = CommandRunner::new(temp.path(), Duration::from_secs(10), 4);
        let result = runner.run("printf abcdefgh").expect("run");
        assert_eq!(result.stdout, "abcd\n[stdout truncated 4 bytes]\n");
    }
}
