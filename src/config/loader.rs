//! Configuration file loading.
//!
//! The raw file bytes are kept next to the parsed configuration so the
//! planner can fingerprint exactly what was read.

use crate::config::schema::FoundryConfig;
use crate::config::validator::validate;
use crate::error::{AnvilError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".foundry.yaml";

/// A parsed and validated configuration together with its source bytes.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Where the configuration was read from
    pub path: PathBuf,
    /// The validated configuration
    pub config: FoundryConfig,
    /// The file contents exactly as read
    pub raw: Vec<u8>,
}

/// Load, parse and validate a configuration file.
///
/// # Errors
///
/// - `ConfigNotFound` if the file does not exist
/// - `ConfigParseError` if the YAML is malformed or has unknown keys
/// - `ConfigValidationError` if any validation rule fails
pub fn load_config(path: &Path) -> Result<LoadedConfig> {
    let raw = read_raw(path)?;
    let config = parse_config(&raw, path)?;
    validate(&config)?;

    tracing::debug!(
        path = %path.display(),
        project = %config.project.name,
        profiles = config.profiles.len(),
        "Loaded configuration"
    );

    Ok(LoadedConfig {
        path: path.to_path_buf(),
        config,
        raw,
    })
}

/// Read a configuration file's bytes without parsing them.
pub fn read_raw(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AnvilError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            AnvilError::Io(e)
        }
    })
}

/// Parse YAML content into a [`FoundryConfig`] without validating it.
///
/// # Arguments
///
/// * `content` - The YAML content to parse
/// * `source_path` - Path for error reporting
pub fn parse_config(content: &[u8], source_path: &Path) -> Result<FoundryConfig> {
    serde_yaml::from_slice(content).map_err(|e| AnvilError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}
