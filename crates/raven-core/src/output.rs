//! Writing upload responses as JSON or JSON Lines.
//!
//! JSON emits the whole response as one document. JSON Lines flattens it:
//! one `variant` record per manifest entry, one `failure` record per failed
//! width, then a closing `summary` record carrying the status and timings.

use serde::Serialize;
use std::io::{self, Write};

use crate::pipeline::batch::{UploadFailure, UploadResponse, UploadStatus};
use crate::types::VariantResult;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON document per response
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// One line of JSON Lines output.
#[derive(Debug, Serialize)]
#[serde(tag = "record", rename_all = "lowercase")]
enum ResponseLine<'a> {
    Variant {
        width: u32,
        #[serde(flatten)]
        result: &'a VariantResult,
    },
    Failure(&'a UploadFailure),
    Summary {
        status: UploadStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<&'a str>,
        #[serde(rename = "onServer", skip_serializing_if = "Option::is_none")]
        on_server: Option<u64>,
        #[serde(rename = "executionTime", skip_serializing_if = "Option::is_none")]
        execution_time: Option<f64>,
        #[serde(rename = "beginTime", skip_serializing_if = "Option::is_none")]
        begin_time: Option<f64>,
    },
}

/// Serializes upload responses to an underlying writer.
pub struct ResponseWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
}

impl<W: Write> ResponseWriter<W> {
    /// `pretty` only affects [`OutputFormat::Json`].
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
        }
    }

    /// Write one response.
    pub fn write(&mut self, response: &UploadResponse) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, response)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, response).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
            }
            OutputFormat::JsonLines => {
                if let Some(manifest) = &response.img_data {
                    for (width, result) in manifest {
                        self.line(&ResponseLine::Variant {
                            width: *width,
                            result,
                        })?;
                    }
                }
                for failure in &response.failures {
                    self.line(&ResponseLine::Failure(failure))?;
                }
                self.line(&ResponseLine::Summary {
                    status: response.status,
                    reason: response.reason.as_deref(),
                    detail: response.detail.as_deref(),
                    on_server: response.on_server,
                    execution_time: response.execution_time,
                    begin_time: response.begin_time,
                })?;
            }
        }
        Ok(())
    }

    fn line(&mut self, line: &ResponseLine<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, line).map_err(io::Error::other)?;
        writeln!(self.writer)
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
