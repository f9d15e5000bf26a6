//! Drives one image through validation, planning, fan-out and aggregation.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult, VariantError};
use crate::types::{
    Classification, ImageReport, Manifest, UploadSession, VariantFailure, VariantResult,
};

use super::codec::{CodecError, ImageCodec};
use super::planner::SizePlanner;
use super::source::{format_to_string, SourceImage};
use super::validate::Validator;
use super::worker::VariantWorker;

/// Lifecycle of one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Planning,
    FanningOut,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Planning => "planning",
            Stage::FanningOut => "fanning-out",
            Stage::Aggregating => "aggregating",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A staged upload that is removed when dropped.
#[derive(Debug)]
pub struct TransientFile {
    path: PathBuf,
}

impl TransientFile {
    /// Take ownership of the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!("Could not remove transient file {:?}: {}", self.path, e);
        }
    }
}

/// Manifest under construction, written concurrently by worker threads.
///
/// [`SharedManifest::into_manifest`] consumes the handle, so nothing can
/// write to a manifest once it has been handed back to the caller.
#[derive(Debug, Clone, Default)]
pub struct SharedManifest {
    inner: Arc<Mutex<Manifest>>,
}

impl SharedManifest {
    pub fn insert(&self, width: u32, result: VariantResult) {
        let mut manifest = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        manifest.insert(width, result);
    }

    /// Freeze into a plain manifest. Call after every writer has finished.
    pub fn into_manifest(self) -> Manifest {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(|e| e.into_inner()),
            Err(shared) => shared.lock().unwrap_or_else(|e| e.into_inner()).clone(),
        }
    }
}

/// Runs the variant pipeline for one image at a time.
pub struct Orchestrator {
    codec: Arc<dyn ImageCodec>,
    validator: Validator,
    worker: VariantWorker,
    max_concurrent_workers: usize,
}

impl Orchestrator {
    /// Create an orchestrator writing variants under the configured base
    /// directory.
    pub fn new(config: &Config, codec: Arc<dyn ImageCodec>) -> Self {
        Self::with_base_dir(config, codec, config.base_dir())
    }

    /// Create an orchestrator writing variants under `base_dir`.
    pub fn with_base_dir(config: &Config, codec: Arc<dyn ImageCodec>, base_dir: PathBuf) -> Self {
        Self {
            worker: VariantWorker::new(Arc::clone(&codec), base_dir, &config.variants),
            codec,
            validator: Validator::new(config.limits.clone()),
            max_concurrent_workers: config.variants.max_concurrent_workers.max(1),
        }
    }

    /// Process one staged upload.
    ///
    /// The transient file is removed when this returns, whatever the outcome.
    /// Validation failures abort the image; failures of individual widths are
    /// reported in [`ImageReport::failures`] and leave sibling widths intact.
    pub async fn run(
        &self,
        classification: Classification,
        transient: TransientFile,
        session: &UploadSession,
    ) -> PipelineResult<ImageReport> {
        let start = Instant::now();
        let path = transient.path().to_path_buf();

        tracing::debug!(stage = %Stage::Validating, ?path, "Processing upload");
        let source = match self.validate(&path).await {
            Ok(source) => source,
            Err(e) => {
                tracing::debug!(stage = %Stage::Failed, ?path, "Validation failed: {}", e);
                return Err(e);
            }
        };

        tracing::debug!(stage = %Stage::Planning, %classification);
        let plan = SizePlanner::plan(classification, source.dimensions());
        let widths: Vec<u32> = plan.iter().map(|s| s.max_width).collect();
        tracing::debug!(
            "Planned {} variant(s) for {}x{} {}: {:?}",
            plan.len(),
            source.width,
            source.height,
            format_to_string(source.format),
            widths
        );

        tracing::debug!(stage = %Stage::FanningOut, workers = plan.len());
        let source = Arc::new(source);
        let manifest = SharedManifest::default();
        let permits = Arc::new(Semaphore::new(self.max_concurrent_workers));
        let mut tasks = JoinSet::new();

        for spec in plan {
            let permit = Arc::clone(&permits).acquire_owned().await.ok();
            let worker = self.worker.clone();
            let source = Arc::clone(&source);
            let session = session.clone();
            let manifest = manifest.clone();

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let width = spec.max_width;
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    worker.run(&source, spec, &session)
                }))
                .unwrap_or_else(|payload| Err(VariantError::Panicked(panic_message(payload))));

                match outcome {
                    Ok(result) => {
                        manifest.insert(width, result);
                        None
                    }
                    Err(e) => Some(VariantFailure {
                        width,
                        reason: e.to_string(),
                    }),
                }
            });
        }

        tracing::debug!(stage = %Stage::Aggregating);
        let mut failures = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(None) => {}
                Ok(Some(failure)) => {
                    tracing::warn!(
                        "Variant {} failed for {:?}: {}",
                        failure.width,
                        path,
                        failure.reason
                    );
                    failures.insert(failure.width, failure);
                }
                Err(e) => tracing::error!("Variant task error: {}", e),
            }
        }

        let report = ImageReport {
            manifest: manifest.into_manifest(),
            failures: failures.into_values().collect(),
        };
        tracing::debug!(
            stage = %Stage::Done,
            variants = report.manifest.len(),
            failed = report.failures.len(),
            "Processed {:?} in {:?}",
            path,
            start.elapsed()
        );

        Ok(report)
    }

    /// The `Validating` stage: size, signature, structural decode, dimensions.
    async fn validate(&self, path: &Path) -> PipelineResult<SourceImage> {
        self.validator.check_file(path)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::InvalidImage {
                path: path.to_path_buf(),
                message: format!("Cannot read file: {}", e),
            })?;
        self.validator.check_signature(path, &bytes)?;

        let bytes: Arc<[u8]> = bytes.into();
        let codec = Arc::clone(&self.codec);
        let verify_bytes = Arc::clone(&bytes);
        let info = tokio::task::spawn_blocking(move || codec.verify(&verify_bytes))
            .await
            .map_err(|e| PipelineError::InvalidImage {
                path: path.to_path_buf(),
                message: format!("Task join error: {}", e),
            })?
            .map_err(|e| match e {
                CodecError::Format(format) => PipelineError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    format,
                },
                other => PipelineError::InvalidImage {
                    path: path.to_path_buf(),
                    message: other.to_string(),
                },
            })?;
        self.validator.check_dimensions(path, &info)?;

        Ok(SourceImage::new(bytes, info))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::codec::RasterCodec;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::FanningOut.to_string(), "fanning-out");
        assert_eq!(Stage::Failed.to_string(), "failed");
    }

    #[test]
    fn test_transient_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload");
        std::fs::write(&path, b"data").unwrap();
        {
            let guard = TransientFile::new(&path);
            assert!(guard.path().exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_transient_file_missing_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        drop(TransientFile::new(dir.path().join("never-written")));
    }

    #[test]
    fn test_shared_manifest_freezes_inserts() {
        let shared = SharedManifest::default();
        let writer = shared.clone();
        let output = crate::types::OutputRef {
            path: PathBuf::from("d/f.gif"),
            hash: "h".to_string(),
        };
        writer.insert(
            16,
            VariantResult {
                legacy: output.clone(),
                modern: output,
                resize_secs: 0.0,
                total_secs: 0.1,
            },
        );
        drop(writer);
        let manifest = shared.into_manifest();
        assert_eq!(manifest.len(), 1);
        assert!(manifest.contains_key(&16));
    }

    #[tokio::test]
    async fn test_invalid_upload_fails_and_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("upload");
        std::fs::write(&upload, b"this is not an image at all").unwrap();

        let orchestrator = Orchestrator::with_base_dir(
            &Config::default(),
            Arc::new(RasterCodec),
            dir.path().to_path_buf(),
        );
        let session = UploadSession::new("t", "d");
        let result = orchestrator
            .run(
                Classification::GenericImage,
                TransientFile::new(&upload),
                &session,
            )
            .await;

        let err = result.unwrap_err();
        assert!(err.is_validation_failure());
        assert!(!upload.exists());
    }
}
