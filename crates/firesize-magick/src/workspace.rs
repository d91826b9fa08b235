//! Per-request workspace directories.
//!
//! A [`Workspace`] owns a uniquely named temporary directory holding the
//! downloaded source, the coalesced intermediate and the transform output.
//! Whether the directory is removed when the workspace is dropped is decided
//! by the configured [`CleanupPolicy`] and by whether the request succeeded.

use std::path::{Path, PathBuf};

use firesize_core::config::{CleanupPolicy, PipelineConfig};
use firesize_core::{Error, Result};
use tempfile::TempDir;

/// Name of the downloaded source file.
pub const INPUT_FILE: &str = "in";

/// Name of the coalesced intermediate file.
pub const COALESCED_FILE: &str = "temp";

/// Stem of the transform output; the descriptor may add an extension.
pub const OUTPUT_STEM: &str = "out";

/// Temporary directory for one pipeline run.
///
/// # Example
///
/// ```no_run
/// use firesize_core::config::PipelineConfig;
/// use firesize_magick::Workspace;
///
/// let mut workspace = Workspace::create(&PipelineConfig::default()).unwrap();
/// let input = workspace.input();
/// // ... download into `input`, transform into workspace.output_stem() ...
/// workspace.mark_succeeded();
/// ```
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
    cleanup: CleanupPolicy,
    succeeded: bool,
}

impl Workspace {
    /// Create a new, empty workspace directory.
    ///
    /// The directory is named `<workspace_prefix><random>` and placed in
    /// `temp_root`, or the system temp dir when that is unset.
    pub fn create(config: &PipelineConfig) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&config.workspace_prefix);

        let dir = match config.temp_root {
            Some(ref root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| Error::Workspace { source: e })?;

        let path = dir.path().to_path_buf();
        tracing::debug!(workspace = %path.display(), "created workspace");

        Ok(Self {
            dir: Some(dir),
            path,
            cleanup: config.cleanup,
            succeeded: false,
        })
    }

    /// Path to the workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path for a named file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Where the remote source is downloaded.
    pub fn input(&self) -> PathBuf {
        self.file(INPUT_FILE)
    }

    /// Where an animated source is coalesced to.
    pub fn coalesced(&self) -> PathBuf {
        self.file(COALESCED_FILE)
    }

    /// Output path before any format extension is added.
    pub fn output_stem(&self) -> PathBuf {
        self.file(OUTPUT_STEM)
    }

    /// Record that the request produced and served its output.
    pub fn mark_succeeded(&mut self) {
        self.succeeded = true;
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        if self.cleanup.removes(self.succeeded) {
            // Blocking removal, also on runtime workers. A workspace holds at
            // most three files and must be gone when drop returns.
            if let Err(e) = dir.close() {
                tracing::warn!(
                    workspace = %self.path.display(),
                    "failed to remove workspace: {e}"
                );
            }
        } else {
            let kept = dir.keep();
            tracing::debug!(workspace = %kept.display(), "keeping workspace");
        }
    }
}
