//! Request orchestration: workspace, fetch, normalize, transform.
//!
//! [`Pipeline::process`] runs the steps strictly in order and returns the
//! first failure unchanged. On success it hands back a [`Processed`] result
//! that keeps the workspace alive until the caller has served the output.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use firesize_core::config::PipelineConfig;
use firesize_core::Result;

use crate::actions;
use crate::descriptor::TransformDescriptor;
use crate::events::{PipelineEvents, TracingEvents};
use crate::fetch;
use crate::normalize::normalize;
use crate::tools::ToolRegistry;
use crate::workspace::Workspace;

/// Steps of a pipeline run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Fetch,
    Normalize,
    Transform,
    Serve,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Fetch => "fetch",
            Stage::Normalize => "normalize",
            Stage::Transform => "transform",
            Stage::Serve => "serve",
        };
        f.write_str(name)
    }
}

/// A finished transform, ready to be served.
///
/// Dropping it releases the workspace according to the cleanup policy; call
/// [`Processed::finish`] once the output has been handed to the client.
#[derive(Debug)]
pub struct Processed {
    workspace: Workspace,
    output: PathBuf,
}

impl Processed {
    /// The transform output.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// The workspace directory holding the output.
    pub fn workspace_dir(&self) -> &Path {
        self.workspace.path()
    }

    /// Mark the request as served and release the workspace.
    pub fn finish(mut self) {
        tracing::debug!(stage = %Stage::Serve, output = %self.output.display(), "served");
        self.workspace.mark_succeeded();
    }
}

/// Image processing pipeline shared by all requests.
#[derive(Clone)]
pub struct Pipeline {
    tools: Arc<ToolRegistry>,
    config: PipelineConfig,
    client: reqwest::Client,
    events: Arc<dyn PipelineEvents>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("tools", &self.tools)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Build a pipeline that logs through `tracing`.
    pub fn new(tools: Arc<ToolRegistry>, config: PipelineConfig) -> Self {
        Self {
            tools,
            config,
            client: reqwest::Client::new(),
            events: Arc::new(TracingEvents),
        }
    }

    /// Replace the event sink.
    pub fn with_events(mut self, events: Arc<dyn PipelineEvents>) -> Self {
        self.events = events;
        self
    }

    /// Run one request through the pipeline.
    ///
    /// If the source turns out to be animated, the descriptor's format is
    /// switched to [`crate::ANIMATED_FORMAT`] before the transform runs.
    pub async fn process<D>(&self, descriptor: &mut D) -> Result<Processed>
    where
        D: TransformDescriptor + ?Sized,
    {
        tracing::debug!(stage = %Stage::Init, url = %descriptor.url());
        let workspace = Workspace::create(&self.config)?;

        tracing::debug!(stage = %Stage::Fetch, workspace = %workspace.path().display());
        let input =
            fetch::download(&self.client, &workspace, descriptor.url(), &*self.events).await?;

        tracing::debug!(stage = %Stage::Normalize);
        let normalized =
            normalize(&self.tools, &workspace, &input, &self.config, &*self.events).await?;
        if let Some(format) = normalized.format_override {
            if descriptor.format() != Some(format) {
                tracing::debug!(
                    requested = ?descriptor.format(),
                    forced = format,
                    "animated source; overriding output format"
                );
            }
            descriptor.set_format(format);
        }

        tracing::debug!(stage = %Stage::Transform);
        let output = actions::transform(
            &self.tools,
            &normalized.path,
            &workspace.output_stem(),
            &*descriptor,
            self.config.transform_timeout,
            &*self.events,
        )
        .await?;

        Ok(Processed { workspace, output })
    }
}
