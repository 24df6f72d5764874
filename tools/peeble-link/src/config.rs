//! Configuration loading.
//!
//! A TOML file may override any field of the offline configuration; fields
//! left out keep the shipped defaults.

use std::path::Path;

use peeble_offline::OfflineConfig;

use crate::error::PeebleLinkError;

/// Load the configuration, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<OfflineConfig, PeebleLinkError> {
    let Some(path) = path else {
        return Ok(OfflineConfig::default());
    };
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PeebleLinkError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PeebleLinkError::Io(e)
        }
    })?;
    let config = parse_config_str(&content)?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Parse a configuration from a TOML string.
pub fn parse_config_str(content: &str) -> Result<OfflineConfig, PeebleLinkError> {
    toml::from_str(content)
        .map_err(|e| PeebleLinkError::ConfigParseError(format!("invalid TOML: {e}")))
}
