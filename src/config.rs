//! Configuration file loading.

use std::path::Path;

use anyhow::{Context, Result};
use firesize_core::config::Config;

/// Default config file locations, searched in order.
const DEFAULT_PATHS: &[&str] = &[
    "./firesize.toml",
    "~/.config/firesize/config.toml",
    "/etc/firesize/config.toml",
];

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    Ok(config)
}

/// Load config from an explicit path, the default locations, or fall back to
/// the built-in defaults.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::info!("Using config file {}", path.display());
            return load_config(path);
        }
    }

    Ok(Config::default())
}
