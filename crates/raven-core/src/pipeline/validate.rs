//! Source validation before any variant work begins.

use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

use super::codec::ImageInfo;

/// Validates uploaded files.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check that the file exists and is within the size limit.
    pub fn check_file(&self, path: &Path) -> Result<(), PipelineError> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path).map_err(|e| PipelineError::InvalidImage {
            path: path.to_path_buf(),
            message: format!("Cannot read metadata: {}", e),
        })?;

        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        Ok(())
    }

    /// Check the leading bytes against known image signatures.
    pub fn check_signature(&self, path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
        if bytes.len() < 4 {
            return Err(PipelineError::InvalidImage {
                path: path.to_path_buf(),
                message: "File too small to be a valid image".to_string(),
            });
        }

        if !Self::is_valid_image_header(bytes) {
            return Err(PipelineError::InvalidImage {
                path: path.to_path_buf(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }

        Ok(())
    }

    /// Check verified dimensions against the configured limit.
    pub fn check_dimensions(&self, path: &Path, info: &ImageInfo) -> Result<(), PipelineError> {
        let max_dim = self.limits.max_image_dimension;
        if info.width > max_dim || info.height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width: info.width,
                height: info.height,
                max_dim,
            });
        }
        Ok(())
    }

    fn is_valid_image_header(header: &[u8]) -> bool {
        header.starts_with(&[0xFF, 0xD8, 0xFF])
            || header.starts_with(&[0x89, b'P', b'N', b'G'])
            || header.starts_with(b"GIF8")
            || (header.starts_with(b"RIFF") && (header.len() < 12 || &header[8..12] == b"WEBP"))
            || header.starts_with(b"BM")
            || header.starts_with(&[b'I', b'I', 0x2A, 0x00])
            || header.starts_with(&[b'M', b'M', 0x00, 0x2A])
            || (header.len() >= 12 && &header[4..8] == b"ftyp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    fn validator() -> Validator {
        Validator::new(LimitsConfig::default())
    }

    #[test]
    fn test_magic_bytes_jpeg() {
        assert!(Validator::is_valid_image_header(&[0xFF, 0xD8, 0xFF, 0xE0]));
    }

    #[test]
    fn test_magic_bytes_gif() {
        assert!(Validator::is_valid_image_header(b"GIF89a"));
    }

    #[test]
    fn test_magic_bytes_webp() {
        let header = [b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'E', b'B', b'P'];
        assert!(Validator::is_valid_image_header(&header));
    }

    #[test]
    fn test_magic_bytes_riff_non_webp_rejected() {
        let header = [b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'A', b'V', b'E'];
        assert!(!Validator::is_valid_image_header(&header));
    }

    #[test]
    fn test_magic_bytes_bare_ii_rejected() {
        let header = [b'I', b'I', 0x00, 0x00, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(!Validator::is_valid_image_header(&header));
    }

    #[test]
    fn test_signature_too_short() {
        let err = validator()
            .check_signature(Path::new("x.png"), &[0x89])
            .unwrap_err();
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn test_huge_size_limit_saturates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.png");
        std::fs::write(&path, [0x89]).unwrap();

        let limits = LimitsConfig {
            max_file_size_mb: u64::MAX / 1024,
            ..LimitsConfig::default()
        };
        assert!(Validator::new(limits).check_file(&path).is_ok());
    }

    #[test]
    fn test_file_over_limit_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.png");
        std::fs::write(&path, vec![0u8; 2 * 1024 * 1024]).unwrap();

        let limits = LimitsConfig {
            max_file_size_mb: 1,
            ..LimitsConfig::default()
        };
        let err = Validator::new(limits).check_file(&path).unwrap_err();
        assert!(matches!(err, PipelineError::FileTooLarge { max_mb: 1, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = validator()
            .check_file(Path::new("/nonexistent/upload.png"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn test_file_too_large() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        std::fs::write(&path, vec![0u8; 2 * 1024 * 1024]).unwrap();

        let validator = Validator::new(LimitsConfig {
            max_file_size_mb: 1,
            ..LimitsConfig::default()
        });
        let err = validator.check_file(&path).unwrap_err();
        assert!(matches!(err, PipelineError::FileTooLarge { .. }));
    }

    #[test]
    fn test_dimension_limit() {
        let validator = Validator::new(LimitsConfig {
            max_image_dimension: 100,
            ..LimitsConfig::default()
        });
        let info = ImageInfo {
            format: ImageFormat::Png,
            width: 101,
            height: 10,
        };
        let err = validator
            .check_dimensions(Path::new("x.png"), &info)
            .unwrap_err();
        assert!(matches!(err, PipelineError::ImageTooLarge { .. }));
    }
}
