//! Configuration file loading and default path resolution
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! Tiers 1 and 2 are handled by each binary's argument parser; this module
//! provides tiers 3 and 4.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name used under the platform config/data directories
pub const APP_DIR: &str = "wcj";

/// Default SQLite database file name
pub const DATABASE_FILE: &str = "wc_journey.db";

/// `[logging]` table shared by every tool's TOML config
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when RUST_LOG is not set (e.g. "info", "debug")
    pub level: Option<String>,
}

/// Default config file path for the platform (`<config_dir>/wcj/<file_name>`)
pub fn default_config_path(file_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(file_name))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR).join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from("./wcj_data").join(DATABASE_FILE))
}

/// Parse a TOML config file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load a tool's TOML config if one exists
///
/// An explicitly requested file must exist. A missing file at the default
/// location is not an error: the tool runs on defaults.
pub fn load_optional_toml<T: DeserializeOwned>(
    explicit: Option<&Path>,
    default_file_name: &str,
) -> Result<Option<(PathBuf, T)>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return load_toml(path).map(|config| Some((path.to_path_buf(), config)));
    }

    match default_config_path(default_file_name) {
        Some(path) if path.exists() => load_toml(&path).map(|config| Some((path, config))),
        Some(path) => {
            debug!("No config file at {} - using defaults", path.display());
            Ok(None)
        }
        None => {
            debug!("Could not determine config directory - using defaults");
            Ok(None)
        }
    }
}
