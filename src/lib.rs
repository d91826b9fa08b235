pub mod args;
pub mod config;
pub mod server;

pub use config::{load_config, load_config_or_default};
