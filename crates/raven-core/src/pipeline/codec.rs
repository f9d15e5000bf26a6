//! Image codec capability and its `image`-crate implementation.
//!
//! The [`ImageCodec`] trait is the only place pixel work happens, so the
//! worker and orchestrator stay independent of the concrete image library.
//!
//! | Operation      | [`RasterCodec`]                                     |
//! |----------------|-----------------------------------------------------|
//! | verify/decode  | `ImageReader` with content-sniffed format           |
//! | ensure alpha   | conversion to 8-bit RGBA                            |
//! | fit within box | `resize_exact` with `Lanczos3`, never upscaling     |
//! | encode WebP    | lossless `WebPEncoder`                              |
//! | encode PNG     | `PngEncoder`, compression level chosen from quality |

use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use thiserror::Error;

use crate::naming::VariantFormat;
use crate::types::VariantSpec;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Cannot detect image format: {0}")]
    Format(String),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Transform failed: {0}")]
    Transform(String),
    #[error("{} encode failed: {message}", .format.extension())]
    Encode {
        format: VariantFormat,
        message: String,
    },
}

/// What structural verification learned about a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Pixel operations the variant pipeline needs.
///
/// Implementations must be usable from many blocking worker threads at once.
pub trait ImageCodec: Send + Sync {
    /// Check that `bytes` hold a well-formed image and report its properties.
    fn verify(&self, bytes: &[u8]) -> Result<ImageInfo, CodecError>;

    /// Decode `bytes` into a fresh pixel buffer.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError>;

    /// Make sure the buffer carries an alpha channel.
    fn ensure_alpha(&self, image: DynamicImage) -> DynamicImage;

    /// Shrink to fit within `spec`, preserving aspect ratio. Never upscales.
    fn fit_within(&self, image: DynamicImage, spec: VariantSpec)
        -> Result<DynamicImage, CodecError>;

    /// Encode to `format` at `quality` (1-100).
    fn encode(
        &self,
        image: &DynamicImage,
        format: VariantFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CodecError>;
}

/// Dimensions of `source` fit within `bounds`.
///
/// Aspect ratio is preserved and a source that already fits is returned
/// unchanged. The result never exceeds `bounds` on either axis and is at
/// least 1x1.
pub fn fit_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).min(max_w).max(1);
    let h = ((src_h as f64 * scale).round() as u32).min(max_h).max(1);
    (w, h)
}

/// [`ImageCodec`] backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterCodec;

impl RasterCodec {
    pub fn new() -> Self {
        Self
    }

    fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, CodecError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CodecError::Format(e.to_string()))
    }
}

impl ImageCodec for RasterCodec {
    fn verify(&self, bytes: &[u8]) -> Result<ImageInfo, CodecError> {
        let reader = Self::reader(bytes)?;
        let format = reader
            .format()
            .ok_or_else(|| CodecError::Format("unrecognized signature".to_string()))?;
        let image = reader
            .decode()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        let (width, height) = image.dimensions();
        Ok(ImageInfo {
            format,
            width,
            height,
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        Self::reader(bytes)?
            .decode()
            .map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn ensure_alpha(&self, image: DynamicImage) -> DynamicImage {
        match image {
            DynamicImage::ImageRgba8(_) => image,
            other => DynamicImage::ImageRgba8(other.to_rgba8()),
        }
    }

    fn fit_within(
        &self,
        image: DynamicImage,
        spec: VariantSpec,
    ) -> Result<DynamicImage, CodecError> {
        if spec.max_width == 0 || spec.max_height == 0 {
            return Err(CodecError::Transform(format!(
                "empty target box {}x{}",
                spec.max_width, spec.max_height
            )));
        }

        let current = image.dimensions();
        let (w, h) = fit_dimensions(current, (spec.max_width, spec.max_height));
        if (w, h) == current {
            return Ok(image);
        }
        Ok(image.resize_exact(w, h, FilterType::Lanczos3))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: VariantFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Vec::new();
        let result = match format {
            // The WebP encoder is lossless only, which is what maximum
            // quality asks for anyway.
            VariantFormat::WebP => image.write_with_encoder(WebPEncoder::new_lossless(&mut buffer)),
            VariantFormat::Png => {
                let compression = match quality {
                    90.. => CompressionType::Best,
                    50..=89 => CompressionType::Default,
                    _ => CompressionType::Fast,
                };
                image.write_with_encoder(PngEncoder::new_with_quality(
                    &mut buffer,
                    compression,
                    PngFilterType::Adaptive,
                ))
            }
            VariantFormat::Gif => {
                return Err(CodecError::Encode {
                    format,
                    message: "animated sources are copied, not re-encoded".to_string(),
                })
            }
        };

        result.map_err(|e| CodecError::Encode {
            format,
            message: e.to_string(),
        })?;
        Ok(buffer)
    }
}
