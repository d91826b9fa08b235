//! Structured pipeline records.
//!
//! The pipeline reports what it does through a [`PipelineEvents`]
//! implementation handed to it by the caller. [`TracingEvents`] is the
//! production implementation and writes `tracing` records.

use std::path::Path;

use firesize_core::Error;

/// Sink for the pipeline's observability records. Calls must not block.
pub trait PipelineEvents: Send + Sync {
    /// A download is about to start.
    fn fetch_started(&self, url: &str, local: &Path);

    /// The transform tool is about to run.
    fn transform_started(&self, tool: &str, args: &[String]);

    /// The transform tool failed. `output` is the captured tool output, if
    /// the process got far enough to produce any.
    fn transform_failed(&self, tool: &str, args: &[String], error: &Error, output: Option<&str>);

    /// The probe reported a frame count.
    fn frames_detected(&self, path: &Path, frames: u32);
}

/// [`PipelineEvents`] backed by `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEvents;

impl PipelineEvents for TracingEvents {
    fn fetch_started(&self, url: &str, local: &Path) {
        tracing::info!(processor = "imagick", download = %url, local = %local.display());
    }

    fn transform_started(&self, tool: &str, args: &[String]) {
        tracing::info!(processor = "imagick", tool = %tool, args = ?args);
    }

    fn transform_failed(&self, tool: &str, args: &[String], error: &Error, output: Option<&str>) {
        tracing::error!(
            processor = "imagick",
            tool = %tool,
            failure = %error,
            args = ?args,
            output = output.unwrap_or_default(),
        );
    }

    fn frames_detected(&self, path: &Path, frames: u32) {
        tracing::info!(processor = "imagick", file = %path.display(), num_frames = frames);
    }
}
