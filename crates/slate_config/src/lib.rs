//! Parsing and validation of `slate.toml` project configuration files.
//!
//! This crate reads the project configuration file and produces a strongly-typed
//! [`SlateConfig`] describing where the render cache lives and which render
//! modes participate in its invalidation.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, load_config_or_default, CONFIG_FILE};
pub use types::*;
