//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML by the binary
//! and carries the server, tool and pipeline sections. Every section
//! defaults sensibly so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Short budget for probing a file's frame count.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Long budget for coalescing and transforming.
pub const DEFAULT_TRANSFORM_TIMEOUT: Duration = Duration::from_secs(60);

/// Prefix for per-request workspace directories.
pub const DEFAULT_WORKSPACE_PREFIX: &str = "_firesize";

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub tools: ToolsConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.pipeline.probe_timeout.is_zero() {
            warnings.push(
                "pipeline.probe_timeout_secs is 0; every image will be treated as static".into(),
            );
        }

        if self.pipeline.transform_timeout.is_zero() {
            warnings.push(
                "pipeline.transform_timeout_secs is 0; every transform will time out".into(),
            );
        }

        for (name, path) in [
            ("identify_path", &self.tools.identify_path),
            ("convert_path", &self.tools.convert_path),
        ] {
            if let Some(p) = path {
                if !p.exists() {
                    warnings.push(format!(
                        "tools.{name} {} does not exist; falling back to PATH",
                        p.display()
                    ));
                }
            }
        }

        if let Some(ref root) = self.pipeline.temp_root {
            if !root.is_dir() {
                warnings.push(format!(
                    "pipeline.temp_root {} is not a directory",
                    root.display()
                ));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

/// Overrides for external tool locations. Unset tools are looked up on
/// `PATH`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub identify_path: Option<PathBuf>,
    pub convert_path: Option<PathBuf>,
}

/// What happens to a request's workspace directory once it is released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Leave every workspace on disk.
    #[default]
    Never,
    /// Remove the workspace only when the result was served.
    OnSuccess,
    /// Remove the workspace regardless of outcome.
    Always,
}

impl CleanupPolicy {
    /// Whether a workspace that ended with the given outcome is removed.
    pub fn removes(self, succeeded: bool) -> bool {
        match self {
            CleanupPolicy::Never => false,
            CleanupPolicy::OnSuccess => succeeded,
            CleanupPolicy::Always => true,
        }
    }
}

/// How a failed coalesce of an animated image is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoalescePolicy {
    /// Log the failure and continue with the coalesce target path.
    #[default]
    Ignore,
    /// Abort the request with the coalesce error.
    Fail,
}

/// Pipeline tuning: timeouts, workspace placement and failure policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    #[serde(rename = "probe_timeout_secs", with = "duration_secs")]
    pub probe_timeout: Duration,
    #[serde(rename = "transform_timeout_secs", with = "duration_secs")]
    pub transform_timeout: Duration,
    pub workspace_prefix: String,
    /// Parent directory for workspaces; the system temp dir when unset.
    pub temp_root: Option<PathBuf>,
    pub cleanup: CleanupPolicy,
    pub coalesce_failure: CoalescePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            transform_timeout: DEFAULT_TRANSFORM_TIMEOUT,
            workspace_prefix: DEFAULT_WORKSPACE_PREFIX.into(),
            temp_root: None,
            cleanup: CleanupPolicy::default(),
            coalesce_failure: CoalescePolicy::default(),
        }
    }
}

/// Serde helpers to (de)serialize `Duration` as whole seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
