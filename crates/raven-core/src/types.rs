//! Core data types for the Raven variant pipeline.
//!
//! These types describe what gets planned for an image and what the workers
//! produce for it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Caller-supplied tag selecting the size-planning rule for an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// Profile pictures: fixed square catalog
    Avatar,
    /// Cover art for audio posts: fixed square catalog
    AudioArt,
    /// Art posts: full-size box plus the generic ladder
    Art,
    /// Everything else
    GenericImage,
}

impl Classification {
    /// Canonical tag for this classification.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Avatar => "avatar",
            Classification::AudioArt => "audio-art",
            Classification::Art => "art",
            Classification::GenericImage => "generic-image",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    /// Parse a classification tag (case-insensitive).
    ///
    /// The short upload-form tags `audio` and `image` are accepted as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "avatar" => Ok(Classification::Avatar),
            "audio-art" | "audio" => Ok(Classification::AudioArt),
            "art" => Ok(Classification::Art),
            "generic-image" | "image" => Ok(Classification::GenericImage),
            other => Err(format!("unknown classification: {other}")),
        }
    }
}

/// A target box an output variant is fit into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantSpec {
    pub max_width: u32,
    pub max_height: u32,
}

impl VariantSpec {
    pub const fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Square box of the given edge length.
    pub const fn square(edge: u32) -> Self {
        Self::new(edge, edge)
    }
}

/// Naming inputs for one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSession {
    /// Date-derived token embedded in every file name
    pub date_token: String,

    /// Placement directory, relative to the content base directory
    pub directory: PathBuf,
}

impl UploadSession {
    pub fn new(date_token: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            date_token: date_token.into(),
            directory: directory.into(),
        }
    }

    /// The same session with its placement directory moved under `parent`.
    pub fn nested_under(&self, parent: impl Into<PathBuf>) -> Self {
        let mut directory = parent.into();
        directory.push(&self.directory);
        Self {
            date_token: self.date_token.clone(),
            directory,
        }
    }
}

/// One written output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRef {
    /// Path relative to the content base directory
    pub path: PathBuf,

    /// Hex MD5 digest of the file as written
    pub hash: String,
}

/// Everything produced for one target width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantResult {
    /// Broadly compatible encoding (PNG, or the untouched GIF)
    pub legacy: OutputRef,

    /// Efficient encoding (WebP, or the untouched GIF)
    pub modern: OutputRef,

    /// Seconds spent transforming pixels; 0 when no transform ran
    #[serde(rename = "resize")]
    pub resize_secs: f64,

    /// End-to-end seconds for this worker
    #[serde(rename = "time")]
    pub total_secs: f64,
}

/// Per-image results keyed by target width.
pub type Manifest = BTreeMap<u32, VariantResult>;

/// A target width whose worker did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFailure {
    pub width: u32,
    pub reason: String,
}

/// Outcome of running one image through the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageReport {
    /// Successful variants
    pub manifest: Manifest,

    /// Planned widths that failed, so callers can tell them apart from
    /// widths that were never planned
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<VariantFailure>,
}

impl ImageReport {
    /// True when every planned width produced a variant.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_parse() {
        assert_eq!("avatar".parse::<Classification>(), Ok(Classification::Avatar));
        assert_eq!("Audio".parse::<Classification>(), Ok(Classification::AudioArt));
        assert_eq!("audio-art".parse::<Classification>(), Ok(Classification::AudioArt));
        assert_eq!("image".parse::<Classification>(), Ok(Classification::GenericImage));
        assert!("video".parse::<Classification>().is_err());
    }

    #[test]
    fn test_classification_serde_names() {
        let json = serde_json::to_string(&Classification::AudioArt).unwrap();
        assert_eq!(json, "\"audio-art\"");
        let parsed: Classification = serde_json::from_str("\"generic-image\"").unwrap();
        assert_eq!(parsed, Classification::GenericImage);
    }

    #[test]
    fn test_session_nested_under() {
        let session = UploadSession::new("abc", "d1");
        let nested = session.nested_under("images");
        assert_eq!(nested.directory, PathBuf::from("images/d1"));
        assert_eq!(nested.date_token, "abc");
    }

    #[test]
    fn test_variant_result_field_names() {
        let output = OutputRef {
            path: PathBuf::from("images/d/x_1_16.gif"),
            hash: "00".to_string(),
        };
        let result = VariantResult {
            legacy: output.clone(),
            modern: output,
            resize_secs: 0.0,
            total_secs: 0.5,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["resize"], 0.0);
        assert_eq!(value["time"], 0.5);
        assert_eq!(value["legacy"]["hash"], "00");
    }

    #[test]
    fn test_report_failures_omitted_when_empty() {
        let report = ImageReport::default();
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("failures"));
        assert!(report.is_complete());
    }
}
