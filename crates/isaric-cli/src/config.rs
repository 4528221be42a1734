//! Configuration for the `isaric` command.
//!
//! The configuration file is TOML:
//!
//! ```toml
//! log_level = "info"
//! encoding = "utf-8"
//! output_dir = "out"
//!
//! [encode]
//! collapse_threshold = 0.05
//! ```
//!
//! The file is found, in order, at the `--config` path, at the path in the
//! `ISARIC_CONFIG` environment variable, or at `isaric/config.toml` in the
//! platform configuration directory. A missing file gives the defaults.

use std::path::{Path, PathBuf};

use isaric_cleaning::DEFAULT_COLLAPSE_THRESHOLD;
use isaric_core::{Error, Result};
use isaric_loader::DEFAULT_ENCODING;
use serde::{Deserialize, Serialize};

/// Name used for the configuration directory and in messages.
pub const PROJECT_NAME: &str = "isaric";

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "ISARIC_CONFIG";

const CONFIG_FILENAME: &str = "config.toml";

/// Settings for the `isaric` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsaricConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Default text encoding of project files.
    pub encoding: String,
    /// Directory for encoded output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Encoder settings.
    pub encode: EncodeConfig,
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Share of rows below which one-hot categories collapse into `other`.
    pub collapse_threshold: f64,
}

impl Default for IsaricConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
            output_dir: None,
            encode: EncodeConfig::default(),
        }
    }
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            collapse_threshold: DEFAULT_COLLAPSE_THRESHOLD,
        }
    }
}

impl IsaricConfig {
    /// The configuration file path: the explicit path, else
    /// `ISARIC_CONFIG`, else the default path.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        Self::default_config_path()
    }

    /// `isaric/config.toml` in the platform configuration directory.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(PROJECT_NAME).join(CONFIG_FILENAME))
    }

    /// Load the configuration, falling back to defaults when there is no
    /// file.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values are in range.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.encode.collapse_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::config(format!(
                "encode.collapse_threshold must be between 0 and 1, got {threshold}"
            )));
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}
