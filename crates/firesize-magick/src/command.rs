//! Builder for executing external tool commands under a hard deadline.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use firesize_core::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Default command timeout when the caller sets none.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How long to wait for a killed process to be reaped.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ToolOutput {
    /// Stdout followed by stderr, as one diagnostic blob.
    pub fn combined(&self) -> String {
        combine(&self.stdout, &self.stderr)
    }
}

fn combine(stdout: &str, stderr: &str) -> String {
    match (stdout.is_empty(), stderr.is_empty()) {
        (_, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) => format!("{stdout}\n{stderr}"),
    }
}

/// A builder for constructing and executing external tool invocations.
///
/// The process is killed if it does not exit within the configured timeout.
///
/// # Example
///
/// ```no_run
/// use firesize_magick::ToolCommand;
/// use std::path::PathBuf;
/// use std::time::Duration;
///
/// # async fn example() -> firesize_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("identify"))
///     .args(["-format", "%n"])
///     .arg("/tmp/in")
///     .timeout(Duration::from_secs(10))
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// The short program name used in errors and logs.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// The argument vector as it will be passed to the program.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`Error::Spawn`] if the process cannot be started. No deadline
    ///   applies to this case.
    /// - [`Error::Timeout`] if the process is still running when the timeout
    ///   elapses. The process is killed and reaped before returning.
    /// - [`Error::ToolFailed`] if the process exits non-zero; carries the
    ///   captured output.
    pub async fn execute(&self) -> Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| Error::Spawn {
            tool: program_name.clone(),
            source: e,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let result = {
            let run = async {
                tokio::try_join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
            };
            tokio::time::timeout(self.timeout, run).await
        };

        match result {
            Ok(Ok((status, stdout, stderr))) => {
                let output = ToolOutput {
                    status,
                    stdout: String::from_utf8_lossy(&stdout).to_string(),
                    stderr: String::from_utf8_lossy(&stderr).to_string(),
                };

                if !status.success() {
                    return Err(Error::ToolFailed {
                        tool: program_name,
                        status,
                        output: output.combined(),
                    });
                }

                Ok(output)
            }
            Ok(Err(e)) => Err(Error::tool(
                program_name,
                format!("I/O error waiting for process: {e}"),
            )),
            Err(_elapsed) => {
                tracing::warn!(
                    tool = %program_name,
                    timeout = ?self.timeout,
                    "command timed out; killing"
                );
                // The process may have exited between the deadline and now;
                // killing a reaped child is reported as an error we ignore.
                if let Err(e) = child.start_kill() {
                    tracing::debug!(tool = %program_name, "kill after timeout: {e}");
                }
                if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_err() {
                    tracing::warn!(tool = %program_name, "killed process was not reaped in time");
                }
                Err(Error::Timeout {
                    tool: program_name,
                    timeout: self.timeout,
                })
            }
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}
