//! External tool detection.
//!
//! The [`ToolRegistry`] resolves the ImageMagick executables the pipeline
//! shells out to (`identify` for probing, `convert` for coalescing and
//! transforming) and provides lookup methods for the rest of the crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use firesize_core::config::ToolsConfig;
use firesize_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Frame-count probe.
pub const IDENTIFY: &str = "identify";

/// Coalesce and transform tool.
pub const CONVERT: &str = "convert";

/// Known tool names that the registry manages.
const KNOWN_TOOLS: &[&str] = &[IDENTIFY, CONVERT];

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool paths.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, PathBuf>,
}

impl ToolRegistry {
    /// Discover tools by searching `PATH` (or using overrides from config).
    ///
    /// A configured path is used when it exists; otherwise [`which::which`]
    /// locates the tool. Tools that are not found are omitted.
    pub fn discover(config: &ToolsConfig) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let custom_path = match name {
                IDENTIFY => config.identify_path.as_deref(),
                CONVERT => config.convert_path.as_deref(),
                _ => None,
            };

            let resolved = match custom_path {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(p) => {
                    tracing::warn!(
                        "configured {name} path {} does not exist; searching PATH",
                        p.display()
                    );
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            if let Some(path) = resolved {
                tools.insert(name.to_string(), path);
            }
        }

        Self { tools }
    }

    /// Register `name` at `path`, replacing any discovered location.
    pub fn with_tool(mut self, name: &str, path: PathBuf) -> Self {
        self.tools.insert(name.to_string(), path);
        self
    }

    /// Path to the given tool, or [`Error::Tool`] if it was not found during
    /// discovery.
    pub fn require(&self, name: &str) -> Result<&Path> {
        self.tools
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| {
                Error::tool(name, format!("{name} not found; is it installed and in PATH?"))
            })
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(path) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(path),
                    path: Some(path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_with_default_config() {
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        // We cannot guarantee ImageMagick is installed in CI,
        // but the call itself must not panic.
        let _ = registry.check_all();
    }

    #[test]
    fn require_missing_tool_returns_error() {
        let registry = ToolRegistry::default();
        let err = registry.require(CONVERT).unwrap_err();
        assert!(err.to_string().contains("convert not found"));
    }

    #[test]
    fn check_all_returns_known_tools() {
        let registry = ToolRegistry::default();
        let infos = registry.check_all();
        let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["identify", "convert"]);
        assert!(infos.iter().all(|i| !i.available));
    }

    #[test]
    fn configured_path_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("my-convert");
        std::fs::write(&fake, b"").unwrap();

        let config = ToolsConfig {
            convert_path: Some(fake.clone()),
            ..ToolsConfig::default()
        };
        let registry = ToolRegistry::discover(&config);
        assert_eq!(registry.require(CONVERT).unwrap(), fake.as_path());
    }

    #[test]
    fn with_tool_registers_path() {
        let registry =
            ToolRegistry::default().with_tool(IDENTIFY, PathBuf::from("/opt/im/identify"));
        assert_eq!(
            registry.require(IDENTIFY).unwrap(),
            Path::new("/opt/im/identify")
        );
        assert!(registry.require(CONVERT).is_err());
    }

    #[test]
    fn tool_info_serialization() {
        let info = ToolInfo {
            name: "convert".into(),
            available: true,
            version: Some("Version: ImageMagick 6.9.12".into()),
            path: Some(PathBuf::from("/usr/bin/convert")),
        };
        let json = serde_json::to_string(&info).unwrap();
        let back: ToolInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "convert");
        assert!(back.available);
    }
}
