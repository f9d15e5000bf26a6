//! One variant per target box: transform, encode, persist, hash.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::config::VariantConfig;
use crate::error::VariantError;
use crate::naming::{variant_file_name, VariantFormat};
use crate::types::{OutputRef, UploadSession, VariantResult, VariantSpec};

use super::codec::ImageCodec;
use super::hash::Hasher;
use super::source::{SourceImage, SourceKind};

/// Produces the variant for a single target box.
///
/// Cheap to clone; one clone runs on each blocking worker thread.
#[derive(Clone)]
pub struct VariantWorker {
    codec: Arc<dyn ImageCodec>,
    base_dir: PathBuf,
    file_prefix: String,
    quality: u8,
    hasher: Hasher,
}

impl VariantWorker {
    /// Create a worker writing under `base_dir`.
    pub fn new(codec: Arc<dyn ImageCodec>, base_dir: PathBuf, config: &VariantConfig) -> Self {
        Self {
            codec,
            base_dir,
            file_prefix: config.file_prefix.clone(),
            quality: config.quality,
            hasher: Hasher::new(config.hash_chunk_size),
        }
    }

    #[cfg(test)]
    fn base_dir(&self) -> &std::path::Path {
        &self.base_dir
    }

    /// Produce the variant for `spec`. Blocking.
    ///
    /// The session's placement directory must already exist under the base
    /// directory.
    pub fn run(
        &self,
        source: &SourceImage,
        spec: VariantSpec,
        session: &UploadSession,
    ) -> Result<VariantResult, VariantError> {
        let start = Instant::now();

        let (legacy, modern, resize_secs) = match source.kind {
            SourceKind::Animated => {
                let output =
                    self.write_output(&source.bytes, spec, session, VariantFormat::Gif)?;
                (output.clone(), output, 0.0)
            }
            SourceKind::Static => {
                let image = self.codec.decode(&source.bytes)?;
                let image = self.codec.ensure_alpha(image);
                let image = self.codec.fit_within(image, spec)?;
                let resize_secs = start.elapsed().as_secs_f64();

                let webp = self.codec.encode(&image, VariantFormat::WebP, self.quality)?;
                let modern = self.write_output(&webp, spec, session, VariantFormat::WebP)?;

                let png = self.codec.encode(&image, VariantFormat::Png, self.quality)?;
                let legacy = self.write_output(&png, spec, session, VariantFormat::Png)?;

                (legacy, modern, resize_secs)
            }
        };

        let total_secs = start.elapsed().as_secs_f64();
        tracing::trace!(
            width = spec.max_width,
            resize_secs,
            total_secs,
            "Variant written"
        );

        Ok(VariantResult {
            legacy,
            modern,
            resize_secs,
            total_secs,
        })
    }

    /// Write `data` to its variant path, sync it, then hash what landed on disk.
    fn write_output(
        &self,
        data: &[u8],
        spec: VariantSpec,
        session: &UploadSession,
        format: VariantFormat,
    ) -> Result<OutputRef, VariantError> {
        let file_name = variant_file_name(&self.file_prefix, session, spec.max_width, format);
        let relative = session.directory.join(file_name);
        let absolute = self.base_dir.join(&relative);

        let io_err = |source: std::io::Error| VariantError::Io {
            path: absolute.clone(),
            source,
        };

        {
            let mut file = File::create(&absolute).map_err(io_err)?;
            file.write_all(data).map_err(io_err)?;
            file.sync_all().map_err(io_err)?;
        }

        let hash = self.hasher.content_hash(&absolute).map_err(io_err)?;
        Ok(OutputRef {
            path: relative,
            hash,
        })
    }
}
