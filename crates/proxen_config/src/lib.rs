//! Parsing and validation of `proxen.toml` engine configuration files.
//!
//! This crate reads the engine configuration and produces a strongly-typed
//! [`EngineConfig`] describing persistence, per-tier container naming, and
//! where signing material for the elevated tier comes from.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use resolve::{resolve_tier, ResolvedTier};
pub use types::*;
