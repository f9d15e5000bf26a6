//! The decoded, verified source an image's workers share.

use image::ImageFormat;
use std::sync::Arc;

use super::codec::ImageInfo;

/// How a source is turned into variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Animated raster (GIF): stored byte-for-byte, never transformed
    Animated,
    /// Static raster: resized and re-encoded per target box
    Static,
}

impl SourceKind {
    pub fn from_format(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Gif => SourceKind::Animated,
            _ => SourceKind::Static,
        }
    }
}

/// An uploaded image that passed validation.
///
/// The bytes are immutable and shared by reference count; every worker
/// decodes its own pixel buffer from them.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub bytes: Arc<[u8]>,
    pub format: ImageFormat,
    pub kind: SourceKind,
    pub width: u32,
    pub height: u32,
}

impl SourceImage {
    pub fn new(bytes: impl Into<Arc<[u8]>>, info: ImageInfo) -> Self {
        Self {
            bytes: bytes.into(),
            format: info.format,
            kind: SourceKind::from_format(info.format),
            width: info.width,
            height: info.height,
        }
    }

    /// Natural (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Lowercase name of a detected format, for logs and error messages.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        ImageFormat::Ico => "ico".to_string(),
        ImageFormat::Pnm => "pnm".to_string(),
        ImageFormat::Avif => "avif".to_string(),
        _ => "unknown".to_string(),
    }
}
