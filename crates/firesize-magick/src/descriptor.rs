//! The seam between a request's transformation parameters and the pipeline.

use std::path::{Path, PathBuf};

/// A requested transformation: where the source lives, what format to
/// produce, and how to turn that into a `convert` argument vector.
pub trait TransformDescriptor {
    /// URL of the source image.
    fn url(&self) -> &str;

    /// Requested output format (file extension), if any.
    fn format(&self) -> Option<&str>;

    /// Replace the requested output format.
    fn set_format(&mut self, format: &str);

    /// Build the `convert` arguments for reading `input` and writing to
    /// `output`. Returns the arguments and the path the tool will actually
    /// write, which may carry a format extension.
    fn command_args(&self, input: &Path, output: &Path) -> (Vec<String>, PathBuf);
}
