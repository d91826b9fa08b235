//! firesize-core: shared error and configuration types.
//!
//! This crate is the foundational dependency for the other firesize crates,
//! providing the unified error type every pipeline step returns and the
//! configuration structs the server, CLI and pipeline are built from.

pub mod config;
pub mod error;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
