//! Error types for the Raven variant pipeline.
//!
//! Errors are split by scope: [`PipelineError`] aborts a whole image,
//! [`VariantError`] only ever affects a single target width and is folded
//! into the image report instead of being propagated.

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::codec::CodecError;

/// Anything that can stop an upload outright.
#[derive(Error, Debug)]
pub enum RavenError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Placement or transient directory could not be prepared
    #[error("filesystem: {0}")]
    Io(#[from] std::io::Error),
}

/// Problems loading `raven.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value is out of range, or the config could not be serialized
    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// Errors that abort processing of one source image.
///
/// Everything except [`PipelineError::Staging`] is a validation failure:
/// the source was rejected before any variant work began.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no such upload: {0}")]
    FileNotFound(PathBuf),

    #[error("{path} is {size_mb}MB, over the {max_mb}MB limit")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    #[error("{path} is {width}x{height}, over the {max_dim}px limit")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// The signature matched but no decoder recognised the format
    #[error("{path}: unsupported format ({format})")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// The file failed structural verification
    #[error("{path} is not a valid image: {message}")]
    InvalidImage { path: PathBuf, message: String },

    /// The upload could not be staged as a transient file
    #[error("cannot stage {path}: {message}")]
    Staging { path: PathBuf, message: String },
}

impl PipelineError {
    /// Whether this error means the source image itself was rejected.
    pub fn is_validation_failure(&self) -> bool {
        !matches!(self, PipelineError::Staging { .. })
    }
}

/// Failure of a single variant worker.
#[derive(Error, Debug)]
pub enum VariantError {
    /// Decode, transform or encode failed inside the codec
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Writing or hashing an output file failed
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker panicked
    #[error("Worker panicked: {0}")]
    Panicked(String),
}

/// Convenience type alias for Raven results.
pub type Result<T> = std::result::Result<T, RavenError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
