//! # firesize-magick
//!
//! Remote image fetching and ImageMagick-driven transformation for the
//! firesize service.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find `identify` and `convert`.
//! - **Command execution** ([`ToolCommand`]) -- async builder that kills
//!   processes running past their deadline.
//! - **Workspace management** ([`Workspace`]) -- per-request temporary
//!   directory with a configurable cleanup policy.
//! - **Pipeline steps** -- [`fetch::download`], [`probe::is_animated`],
//!   [`normalize::normalize`] and the [`actions`] that run `convert`.
//! - **Orchestration** ([`Pipeline`]) -- runs the steps for one request and
//!   reports through an injected [`PipelineEvents`] sink.

pub mod actions;
pub mod command;
pub mod descriptor;
pub mod events;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod probe;
pub mod tools;
pub mod workspace;

#[cfg(test)]
mod testutil;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use descriptor::TransformDescriptor;
pub use events::{PipelineEvents, TracingEvents};
pub use normalize::{Normalized, ANIMATED_FORMAT};
pub use pipeline::{Pipeline, Processed, Stage};
pub use tools::{ToolInfo, ToolRegistry};
pub use workspace::Workspace;
