//! Pre-transform normalization of animated sources.

use std::path::{Path, PathBuf};

use firesize_core::config::{CoalescePolicy, PipelineConfig};
use firesize_core::Result;

use crate::actions;
use crate::events::PipelineEvents;
use crate::probe;
use crate::tools::{ToolRegistry, CONVERT, IDENTIFY};
use crate::workspace::Workspace;

/// Format forced onto the request when the source is animated. Upstream
/// callers sometimes ask for a still format for animated sources, which
/// would drop every frame but the first.
pub const ANIMATED_FORMAT: &str = "gif";

/// Outcome of normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// File the transform should read.
    pub path: PathBuf,
    /// Output format the caller must switch the request to, if any.
    pub format_override: Option<&'static str>,
}

impl Normalized {
    fn unchanged(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            format_override: None,
        }
    }
}

/// Coalesce `input` if it is animated.
///
/// Static sources, and sources whose probe fails, are passed through
/// untouched. For animated sources the coalesce target is returned along with
/// [`ANIMATED_FORMAT`] as the format override. A failed coalesce is only
/// returned as an error under [`CoalescePolicy::Fail`]; otherwise it is logged
/// and the (possibly missing) coalesce target is still returned.
pub async fn normalize(
    tools: &ToolRegistry,
    workspace: &Workspace,
    input: &Path,
    config: &PipelineConfig,
    events: &dyn PipelineEvents,
) -> Result<Normalized> {
    let animated = match tools.require(IDENTIFY) {
        Ok(identify) => probe::is_animated(identify, input, config.probe_timeout, events).await,
        Err(e) => {
            tracing::debug!("skipping frame probe: {e}");
            false
        }
    };

    if !animated {
        return Ok(Normalized::unchanged(input));
    }

    let target = workspace.coalesced();
    let result = match tools.require(CONVERT) {
        Ok(convert) => actions::coalesce(convert, input, &target, config.transform_timeout).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        match config.coalesce_failure {
            CoalescePolicy::Fail => return Err(e),
            CoalescePolicy::Ignore => {
                tracing::warn!(file = %input.display(), "coalesce failed, continuing: {e}");
            }
        }
    }

    Ok(Normalized {
        path: target,
        format_override: Some(ANIMATED_FORMAT),
    })
}
