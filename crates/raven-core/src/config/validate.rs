//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.server.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.base_dir must not be empty".into(),
            ));
        }
        if self.variants.file_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "variants.file_prefix must not be empty".into(),
            ));
        }
        if self
            .variants
            .file_prefix
            .contains(|c: char| c == '/' || c == '\\')
        {
            return Err(ConfigError::ValidationError(
                "variants.file_prefix must not contain path separators".into(),
            ));
        }
        if self.variants.quality == 0 || self.variants.quality > 100 {
            return Err(ConfigError::ValidationError(
                "variants.quality must be between 1 and 100".into(),
            ));
        }
        if self.variants.max_concurrent_workers == 0 {
            return Err(ConfigError::ValidationError(
                "variants.max_concurrent_workers must be > 0".into(),
            ));
        }
        if self.variants.hash_chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "variants.hash_chunk_size must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}
