//! Unified error type for firesize.
//!
//! Every pipeline step funnels its failures into [`Error`]. The pipeline
//! never translates one kind into another, so the HTTP layer can derive a
//! status code straight from the variant via [`Error::http_status`].

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// Boxed source error for failures coming from foreign crates (HTTP client).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type covering all failure modes in firesize.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The per-request temporary directory could not be created.
    #[error("Workspace error: {source}")]
    Workspace {
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The local download target could not be created.
    #[error("Fetch error: cannot create {}: {source}", path.display())]
    FetchFile {
        /// The file that was being created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The remote request itself failed.
    #[error("Fetch error: request to {url} failed: {source}")]
    Download {
        /// The source URL.
        url: String,
        /// The underlying client error.
        source: BoxError,
    },

    /// The response body could not be copied into the local file.
    #[error("Fetch error: copying {url} to {} failed: {source}", path.display())]
    FetchCopy {
        /// The source URL.
        url: String,
        /// The local destination.
        path: PathBuf,
        /// The underlying stream or I/O error.
        source: BoxError,
    },

    /// An external tool could not be started.
    #[error("Tool error [{tool}]: failed to spawn: {source}")]
    Spawn {
        /// Name of the tool.
        tool: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An external tool exited with a non-zero status.
    #[error("Tool error [{tool}]: exited with {status}: {}", output.trim())]
    ToolFailed {
        /// Name of the tool.
        tool: String,
        /// The exit status reported by the OS.
        status: ExitStatus,
        /// Captured stdout followed by stderr.
        output: String,
    },

    /// An external tool ran past its deadline and was killed.
    #[error("Tool error [{tool}]: timed out after {timeout:?}")]
    Timeout {
        /// Name of the tool.
        tool: String,
        /// The budget that was exceeded.
        timeout: Duration,
    },

    /// Any other external tool failure (not installed, wait failed).
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Download { .. } | Error::FetchCopy { .. } => 502,
            Error::Spawn { .. } | Error::ToolFailed { .. } | Error::Tool { .. } => 502,
            Error::Timeout { .. } => 504,
            Error::Workspace { .. } | Error::FetchFile { .. } => 500,
        }
    }

    /// Whether this error is a process deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Output captured from a tool that exited non-zero, if any.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Error::ToolFailed { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Download`].
    pub fn download(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Download {
            url: url.into(),
            source: source.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
