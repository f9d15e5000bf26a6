//! Configuration management for Raven.
//!
//! Configuration is loaded from `raven.toml` in the platform config directory
//! (or an explicit path). Every section has defaults, so a partial file or no
//! file at all is fine.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Raven.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server identity and storage layout
    pub server: ServerConfig,

    /// Variant generation settings
    pub variants: VariantConfig,

    /// Upload size and dimension ceilings
    pub limits: LimitsConfig,

    /// Log level and format for the binary
    pub logging: LoggingConfig,
}

impl Config {
    /// Load `raven.toml` from [`Config::default_path`], or defaults when absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate an explicit config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Where `raven.toml` lives by default.
    ///
    /// - macOS: ~/Library/Application Support/com.waterfall.raven/raven.toml
    /// - Linux: ~/.config/raven/raven.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\waterfall\raven\config\raven.toml
    ///
    /// Falls back to ~/.raven/raven.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "waterfall", "raven")
            .map(|dirs| dirs.config_dir().to_path_buf().join("raven.toml"))
            .unwrap_or_else(|| expand(Path::new("~/.raven/raven.toml")))
    }

    /// Content base directory (with ~ expansion).
    pub fn base_dir(&self) -> PathBuf {
        expand(&self.server.base_dir)
    }

    /// Transient upload directory (with ~ expansion).
    pub fn tmp_dir(&self) -> PathBuf {
        expand(&self.server.tmp_dir)
    }

    /// Render as TOML, as written by `raven config init`.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
