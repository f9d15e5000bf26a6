//! Raven Core - image variant generation.
//!
//! Raven takes an uploaded image and produces resized, re-encoded,
//! content-hashed variants, returning a manifest of where each variant was
//! written and what its digest is.
//!
//! # Architecture
//!
//! ```text
//! Upload → Validate → Plan sizes → Workers (one per size, concurrent) → Manifest
//! ```
//!
//! Each worker decodes its own copy of the source, fits it into its target
//! box, encodes WebP and PNG (or copies an animated GIF untouched), and hashes
//! what it wrote.
//!
//! # Usage
//!
//! ```rust,ignore
//! use raven_core::{Classification, Config, Raven};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let raven = Raven::new(Config::load()?);
//!     let response = raven
//!         .process_upload(Classification::GenericImage, &["./photo.jpg".into()])
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, RavenError, Result, VariantError};
pub use naming::{FixedNaming, NamingProvider, SystemNaming};
pub use output::{OutputFormat, ResponseWriter};
pub use pipeline::{
    ImageCodec, Orchestrator, RasterCodec, SizePlanner, TransientFile, UploadResponse,
};
pub use types::{
    Classification, ImageReport, Manifest, OutputRef, UploadSession, VariantFailure,
    VariantResult, VariantSpec,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use pipeline::UploadAggregator;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Raven processor - the entry point for handling uploads.
///
/// Plays the part of the upload layer: it allocates naming inputs and the
/// placement directory, stages each file, and runs one [`Orchestrator`] pass
/// per file, one file at a time.
pub struct Raven {
    config: Config,
    naming: Arc<dyn NamingProvider>,
    orchestrator: Orchestrator,
}

impl Raven {
    /// Create a Raven instance with system naming and the raster codec.
    pub fn new(config: Config) -> Self {
        Self::with_parts(config, Arc::new(SystemNaming), Arc::new(RasterCodec))
    }

    /// Create a Raven instance with explicit naming and codec.
    pub fn with_parts(
        config: Config,
        naming: Arc<dyn NamingProvider>,
        codec: Arc<dyn ImageCodec>,
    ) -> Self {
        tracing::debug!("Initializing Raven v{}", VERSION);
        let orchestrator = Orchestrator::new(&config, codec);
        Self {
            config,
            naming,
            orchestrator,
        }
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process every file of one upload.
    ///
    /// A file that fails validation turns the whole upload into a failure
    /// response; variants already written for earlier files stay on disk but
    /// are not reported. Staging and directory errors are returned as `Err`.
    pub async fn process_upload(
        &self,
        classification: Classification,
        files: &[PathBuf],
    ) -> Result<UploadResponse> {
        let start = Instant::now();
        let begin_time = chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0;

        let base_dir = self.config.base_dir();
        let tmp_dir = self.config.tmp_dir();
        let session = self
            .naming
            .session()
            .nested_under(&self.config.server.images_subdir);

        tokio::fs::create_dir_all(base_dir.join(&session.directory)).await?;
        tokio::fs::create_dir_all(&tmp_dir).await?;
        tracing::info!(
            "Upload of {} file(s) as {} into {:?}",
            files.len(),
            classification,
            session.directory
        );

        let mut aggregator = UploadAggregator::new();
        for file in files {
            let outcome = match self.stage(file, &tmp_dir).await {
                Ok(transient) => {
                    self.orchestrator
                        .run(classification, transient, &session)
                        .await
                }
                Err(e) => Err(e),
            };
            match outcome {
                Ok(report) => aggregator.merge(file.clone(), report),
                Err(e) if e.is_validation_failure() => {
                    tracing::warn!("Rejected {:?}: {}", file, e);
                    return Ok(UploadResponse::invalid_image(e.to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let images = aggregator.images();
        let response = aggregator.finish(
            self.config.server.id,
            begin_time,
            start.elapsed().as_secs_f64(),
        );
        tracing::info!(
            "Upload of {} image(s) finished in {:?}: {} width(s), {} failure(s)",
            images,
            start.elapsed(),
            response.img_data.as_ref().map_or(0, |m| m.len()),
            response.failures.len()
        );
        Ok(response)
    }

    /// Copy an upload to a fresh transient file under `tmp_dir`.
    async fn stage(&self, file: &Path, tmp_dir: &Path) -> PipelineResult<TransientFile> {
        // Guard first, so a partial copy is cleaned up too.
        let transient = TransientFile::new(tmp_dir.join(self.naming.transient_name()));
        tokio::fs::copy(file, transient.path())
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => PipelineError::FileNotFound(file.to_path_buf()),
                _ => PipelineError::Staging {
                    path: file.to_path_buf(),
                    message: e.to_string(),
                },
            })?;
        Ok(transient)
    }
}
