//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identity and storage layout of this server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server identifier reported in upload responses
    pub id: u64,

    /// Human-readable server name
    pub name: String,

    /// Content base directory; variants land under it
    pub base_dir: PathBuf,

    /// Subdirectory of `base_dir` holding per-upload placement directories
    pub images_subdir: PathBuf,

    /// Where uploads are staged as transient files while processed
    pub tmp_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            id: 0,
            name: "raven".to_string(),
            base_dir: PathBuf::from("~/.raven/content"),
            images_subdir: PathBuf::from("images"),
            tmp_dir: PathBuf::from("~/.raven/tmp"),
        }
    }
}

/// Variant generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantConfig {
    /// Prefix of every generated file name
    pub file_prefix: String,

    /// Encoder quality, 1-100
    pub quality: u8,

    /// Upper bound on variant workers running at once for one image
    pub max_concurrent_workers: usize,

    /// Read size used when hashing written files
    pub hash_chunk_size: usize,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self {
            file_prefix: "wfraven".to_string(),
            quality: 100,
            max_concurrent_workers: 6,
            hash_chunk_size: 8192,
        }
    }
}

/// Resource limits to protect against problematic uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 65535,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
