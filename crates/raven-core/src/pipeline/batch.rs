//! Request-level aggregation of per-image reports.
//!
//! Images in one upload are processed one after another. Their manifests are
//! merged into a single map keyed only by target width, so a later image
//! replaces an earlier image's entry for the same width.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{ImageReport, Manifest, VariantFailure};

/// Whether an upload as a whole succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Success,
    Failure,
}

/// A failed width, tagged with the upload it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFailure {
    pub file: PathBuf,
    #[serde(flatten)]
    pub failure: VariantFailure,
}

/// Response for one upload request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub status: UploadStatus,

    /// Why the upload failed
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,

    /// Underlying validation error
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,

    /// Identifier of the server that produced the variants
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub on_server: Option<u64>,

    /// Merged manifest of every image in the upload
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub img_data: Option<Manifest>,

    /// Widths that were planned but failed
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<UploadFailure>,

    /// Seconds from request start to response
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub execution_time: Option<f64>,

    /// Request start, unix seconds
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub begin_time: Option<f64>,
}

impl UploadResponse {
    /// Response for an upload rejected because a file was not a valid image.
    pub fn invalid_image(detail: impl Into<String>) -> Self {
        Self {
            status: UploadStatus::Failure,
            reason: Some("Not a valid image".to_string()),
            detail: Some(detail.into()),
            on_server: None,
            img_data: None,
            failures: Vec::new(),
            execution_time: None,
            begin_time: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == UploadStatus::Success
    }
}

/// Merges per-image reports for one upload.
#[derive(Debug, Default)]
pub struct UploadAggregator {
    manifest: Manifest,
    failures: Vec<UploadFailure>,
    images: usize,
}

impl UploadAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one image's report in. Widths already present are overwritten.
    pub fn merge(&mut self, file: impl Into<PathBuf>, report: ImageReport) {
        let file = file.into();
        if !report.is_complete() {
            tracing::warn!(
                "{:?} finished with {} failed width(s)",
                file,
                report.failures.len()
            );
        }
        for (width, result) in report.manifest {
            if self.manifest.insert(width, result).is_some() {
                tracing::warn!(
                    "Width {} from {:?} replaces an earlier image's variant",
                    width,
                    file
                );
            }
        }
        self.failures
            .extend(report.failures.into_iter().map(|failure| UploadFailure {
                file: file.clone(),
                failure,
            }));
        self.images += 1;
    }

    /// Number of images merged so far.
    pub fn images(&self) -> usize {
        self.images
    }

    /// Build the success response.
    pub fn finish(self, server_id: u64, begin_time: f64, execution_time: f64) -> UploadResponse {
        UploadResponse {
            status: UploadStatus::Success,
            reason: None,
            detail: None,
            on_server: Some(server_id),
            img_data: Some(self.manifest),
            failures: self.failures,
            execution_time: Some(execution_time),
            begin_time: Some(begin_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OutputRef, VariantResult};

    fn result(path: &str) -> VariantResult {
        let output = OutputRef {
            path: PathBuf::from(path),
            hash: format!("hash-of-{path}"),
        };
        VariantResult {
            legacy: output.clone(),
            modern: output,
            resize_secs: 0.0,
            total_secs: 0.0,
        }
    }

    fn report(entries: &[(u32, &str)]) -> ImageReport {
        ImageReport {
            manifest: entries.iter().map(|(w, p)| (*w, result(p))).collect(),
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_later_image_wins_on_shared_width() {
        let mut agg = UploadAggregator::new();
        agg.merge("a.png", report(&[(1280, "a1280"), (810, "a810")]));
        agg.merge("b.png", report(&[(1280, "b1280")]));

        let response = agg.finish(1, 0.0, 0.0);
        let data = response.img_data.unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[&1280].legacy.path, PathBuf::from("b1280"));
        assert_eq!(data[&810].legacy.path, PathBuf::from("a810"));
    }

    #[test]
    fn test_failures_are_tagged_with_file() {
        let mut agg = UploadAggregator::new();
        agg.merge(
            "a.png",
            ImageReport {
                manifest: Manifest::new(),
                failures: vec![VariantFailure {
                    width: 540,
                    reason: "boom".to_string(),
                }],
            },
        );
        assert_eq!(agg.images(), 1);

        let response = agg.finish(1, 0.0, 0.0);
        assert_eq!(response.failures.len(), 1);
        assert_eq!(response.failures[0].file, PathBuf::from("a.png"));
        assert_eq!(response.failures[0].failure.width, 540);
    }

    #[test]
    fn test_success_response_json_shape() {
        let mut agg = UploadAggregator::new();
        agg.merge("a.gif", report(&[(16, "x")]));
        let response = agg.finish(42, 1700000000.0, 0.25);
        assert!(response.is_success());

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["onServer"], 42);
        assert_eq!(value["executionTime"], 0.25);
        assert!(value["imgData"]["16"].is_object());
        assert!(value.get("reason").is_none());
        assert!(value.get("failures").is_none());
    }

    #[test]
    fn test_invalid_image_response_json_shape() {
        let response = UploadResponse::invalid_image("bad magic");
        assert!(!response.is_success());

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "failure");
        assert_eq!(value["reason"], "Not a valid image");
        assert_eq!(value["detail"], "bad magic");
        assert!(value.get("imgData").is_none());
    }
}
