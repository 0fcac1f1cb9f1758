//! Bounded execution of ffmpeg/ffprobe.
//!
//! A [`ToolCommand`] runs one child process with stdin closed, captures both
//! output streams, and kills the child if it outlives its deadline. Every way
//! a run can go wrong is a [`RunError`] variant, so adapters can fold them
//! into their own error types without string matching.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;

/// Deadline applied when the caller does not set one.
const DEFAULT_DEADLINE: Duration = Duration::from_secs(300);

/// Captured streams of a successful run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Why a tool run did not produce usable output.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{tool}: could not start: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("{tool}: killed after exceeding {deadline:?}")]
    Deadline { tool: String, deadline: Duration },

    #[error("{tool}: {status}: {stderr}")]
    Exit {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{tool}: lost track of child: {source}")]
    Wait {
        tool: String,
        source: std::io::Error,
    },
}

impl RunError {
    pub fn is_deadline(&self) -> bool {
        matches!(self, RunError::Deadline { .. })
    }
}

/// One invocation of an external tool.
///
/// ```no_run
/// use ms_av::ToolCommand;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), ms_av::RunError> {
/// let out = ToolCommand::new("ffprobe")
///     .args(["-v", "error", "-show_entries", "format=duration,size"])
///     .arg("/srv/media/clip.mp4")
///     .deadline(Duration::from_secs(60))
///     .run()
///     .await?;
/// println!("{}", out.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    deadline: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments rendered for logs and assertions.
    pub fn display_args(&self) -> String {
        self.args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Run to completion, failing on spawn error, deadline or non-zero exit.
    pub async fn run(&self) -> Result<ToolOutput, RunError> {
        let tool = self.tool_name();
        tracing::debug!(tool = %tool, args = %self.display_args(), "Running tool");

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        // On expiry the wait future is dropped along with the child, killing it.
        let output = match tokio::time::timeout(self.deadline, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(RunError::Wait { tool, source }),
            Err(_) => {
                tracing::warn!(tool = %tool, deadline = ?self.deadline, "Tool exceeded deadline");
                return Err(RunError::Deadline {
                    tool,
                    deadline: self.deadline,
                });
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(RunError::Exit {
                tool,
                status: output.status,
                stderr,
            });
        }

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}
