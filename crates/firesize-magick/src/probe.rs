//! Animated-image detection via `identify -format %n`.

use std::path::Path;
use std::time::Duration;

use crate::command::ToolCommand;
use crate::events::PipelineEvents;

/// Ask `identify` how many frames `path` holds.
///
/// Returns `None` when the probe cannot be started, fails, times out or
/// prints something that is not a frame count. None of these abort the
/// pipeline.
pub async fn frame_count(
    identify: &Path,
    path: &Path,
    timeout: Duration,
    events: &dyn PipelineEvents,
) -> Option<u32> {
    let mut cmd = ToolCommand::new(identify.to_path_buf());
    cmd.args(["-format", "%n"])
        .arg(path.to_string_lossy())
        .timeout(timeout);

    let output = match cmd.execute().await {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(file = %path.display(), "frame probe failed: {e}");
            return None;
        }
    };

    match parse_frame_count(&output.stdout) {
        Some(frames) => {
            events.frames_detected(path, frames);
            Some(frames)
        }
        None => {
            tracing::debug!(
                file = %path.display(),
                stdout = %output.stdout,
                "unparseable frame count"
            );
            None
        }
    }
}

/// Decode `identify -format %n` output.
///
/// ImageMagick prints the count once per frame with no separator, so a
/// 3-frame GIF yields `333` and a 10-frame one `10101010101010101010`. The
/// count `n` is the prefix that, repeated `n` times, spells the whole
/// output. Output that is not such a repetition is read as a plain integer.
fn parse_frame_count(stdout: &str) -> Option<u32> {
    let text = stdout.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    for len in 1..=text.len() {
        if text.len() % len != 0 {
            continue;
        }
        let repeats = text.len() / len;
        let prefix = &text[..len];
        let Ok(n) = prefix.parse::<u32>() else {
            break;
        };
        if n as usize == repeats && text == prefix.repeat(repeats) {
            return Some(n);
        }
    }

    text.parse().ok()
}

/// Whether `path` holds more than one frame. Probe failures count as static.
pub async fn is_animated(
    identify: &Path,
    path: &Path,
    timeout: Duration,
    events: &dyn PipelineEvents,
) -> bool {
    frame_count(identify, path, timeout, events)
        .await
        .is_some_and(|frames| frames > 1)
}
