//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::EngineConfig;
use proxen_common::Tier;
use std::path::Path;

/// Name of the configuration file within a project directory.
pub const CONFIG_FILE: &str = "proxen.toml";

/// Loads and validates a `proxen.toml` configuration from a project directory.
///
/// Reads `<project_dir>/proxen.toml`, parses it, and validates it.
pub fn load_config(project_dir: &Path) -> Result<EngineConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
        path: config_path.clone(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a `proxen.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that names are present and the two tiers cannot collide.
///
/// Tier container names must differ, and when persistence is on the two
/// image files must differ too, since one image holds exactly one tier.
pub fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    for tier in Tier::ALL {
        let tc = config.tiers.get(tier);
        if tc.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ConfigError::EmptyField {
                field: format!("tiers.{tier}.name"),
            });
        }
        if tc.file.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err(ConfigError::EmptyField {
                field: format!("tiers.{tier}.file"),
            });
        }
    }

    let standard = &config.tiers.standard;
    let elevated = &config.tiers.elevated;
    let name = standard.name_or_default(Tier::Standard);
    if name == elevated.name_or_default(Tier::Elevated) {
        return Err(ConfigError::SharedContainerName { name });
    }
    let file = standard.file_or_default(Tier::Standard);
    if config.engine.persist && file == elevated.file_or_default(Tier::Elevated) {
        return Err(ConfigError::SharedImageFile { file });
    }
    Ok(())
}
