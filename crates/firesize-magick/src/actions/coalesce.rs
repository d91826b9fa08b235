//! Flatten an animated image into self-contained frames.

use std::path::{Path, PathBuf};
use std::time::Duration;

use firesize_core::Result;

use crate::command::ToolCommand;

/// Run `convert <input> -coalesce <output>`.
pub async fn coalesce(
    convert: &Path,
    input: &Path,
    output: &Path,
    timeout: Duration,
) -> Result<PathBuf> {
    tracing::debug!("coalesce {:?} -> {:?}", input, output);

    let mut cmd = ToolCommand::new(convert.to_path_buf());
    cmd.arg(input.to_string_lossy())
        .arg("-coalesce")
        .arg(output.to_string_lossy())
        .timeout(timeout);
    cmd.execute().await?;

    Ok(output.to_path_buf())
}
