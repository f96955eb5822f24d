//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::SlateConfig;
use std::path::Path;

/// Name of the configuration file within a project directory.
pub const CONFIG_FILE: &str = "slate.toml";

/// Loads and validates a `slate.toml` configuration from a project directory.
///
/// Reads `<project_dir>/slate.toml`, parses it, and validates its values.
pub fn load_config(project_dir: &Path) -> Result<SlateConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Like [`load_config`], but a missing `slate.toml` yields the defaults.
///
/// Any other read failure, and every parse or validation failure, is still
/// returned as an error.
pub fn load_config_or_default(project_dir: &Path) -> Result<SlateConfig, ConfigError> {
    match load_config(project_dir) {
        Err(ConfigError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(SlateConfig::default())
        }
        other => other,
    }
}

/// Parses and validates a `slate.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<SlateConfig, ConfigError> {
    let config: SlateConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &SlateConfig) -> Result<(), ConfigError> {
    if config.cache.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.dir must not be empty".to_string(),
        ));
    }
    Ok(())
}
