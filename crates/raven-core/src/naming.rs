//! Output naming: per-upload tokens and deterministic variant file names.
//!
//! File names never depend on file content. Two uploads of the same pixels
//! land in different placement directories with different date tokens.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::UploadSession;

/// Letters transient file names are drawn from.
const TRANSIENT_NAME_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of a transient file name.
const TRANSIENT_NAME_LEN: usize = 25;

/// Encoded format of a written variant file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantFormat {
    /// Untouched animated source
    Gif,
    /// Modern efficient raster
    WebP,
    /// Legacy universally supported raster
    Png,
}

impl VariantFormat {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            VariantFormat::Gif => "gif",
            VariantFormat::WebP => "webp",
            VariantFormat::Png => "png",
        }
    }
}

/// Build `<prefix>_<date token>_<width>.<ext>`.
pub fn variant_file_name(
    prefix: &str,
    session: &UploadSession,
    width: u32,
    format: VariantFormat,
) -> String {
    format!(
        "{}_{}_{}.{}",
        prefix,
        session.date_token,
        width,
        format.extension()
    )
}

/// Hex MD5 of a string.
pub(crate) fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Source of per-upload identifiers.
///
/// Implementations must be cheap to call; one session is requested per
/// upload and one transient name per staged file.
pub trait NamingProvider: Send + Sync {
    /// Fresh naming inputs for one upload. The returned directory is a single
    /// path component; callers nest it where they need it.
    fn session(&self) -> UploadSession;

    /// A fresh file name for staging one upload.
    fn transient_name(&self) -> String;
}

/// Timestamp and randomness based naming.
///
/// The date token is the MD5 of the current local time; the placement
/// directory is the MD5 of the date token concatenated with a random integer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNaming;

impl NamingProvider for SystemNaming {
    fn session(&self) -> UploadSession {
        let now = chrono::Local::now()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string();
        let date_token = md5_hex(&now);
        let salt: u32 = rand::thread_rng().gen_range(1..999_999);
        let directory = md5_hex(&format!("{date_token}{salt}"));
        UploadSession::new(date_token, directory)
    }

    fn transient_name(&self) -> String {
        let mut rng = rand::thread_rng();
        TRANSIENT_NAME_CHARS
            .choose_multiple(&mut rng, TRANSIENT_NAME_LEN)
            .map(|&c| c as char)
            .collect()
    }
}

/// Deterministic naming for tests and reproducible runs.
///
/// Every session shares the date token; directories and transient names are
/// numbered in call order.
#[derive(Debug)]
pub struct FixedNaming {
    date_token: String,
    directory_prefix: String,
    counter: std::sync::atomic::AtomicU64,
}

impl FixedNaming {
    pub fn new(date_token: impl Into<String>, directory_prefix: impl Into<String>) -> Self {
        Self {
            date_token: date_token.into(),
            directory_prefix: directory_prefix.into(),
            counter: std::sync::atomic::AtomicU64::new(0),
        }
    }

    fn next(&self) -> u64 {
        self.counter
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    }
}

impl NamingProvider for FixedNaming {
    fn session(&self) -> UploadSession {
        let n = self.next();
        UploadSession::new(
            self.date_token.clone(),
            format!("{}{}", self.directory_prefix, n),
        )
    }

    fn transient_name(&self) -> String {
        format!("upload{}", self.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_variant_file_name() {
        let session = UploadSession::new("d41d8cd9", "dir");
        assert_eq!(
            variant_file_name("wfraven", &session, 540, VariantFormat::WebP),
            "wfraven_d41d8cd9_540.webp"
        );
        assert_eq!(
            variant_file_name("wfraven", &session, 16, VariantFormat::Gif),
            "wfraven_d41d8cd9_16.gif"
        );
    }

    #[test]
    fn test_md5_hex_known_value() {
        assert_eq!(md5_hex(""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_system_session_tokens_are_md5_hex() {
        let session = SystemNaming.session();
        assert_eq!(session.date_token.len(), 32);
        let dir = session.directory.to_string_lossy().to_string();
        assert_eq!(dir.len(), 32);
        assert!(dir.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_system_sessions_get_distinct_directories() {
        let a = SystemNaming.session();
        let b = SystemNaming.session();
        assert_ne!(a.directory, b.directory);
    }

    #[test]
    fn test_transient_name_letters_without_repeats() {
        let name = SystemNaming.transient_name();
        assert_eq!(name.len(), TRANSIENT_NAME_LEN);
        assert!(name.chars().all(|c| c.is_ascii_alphabetic()));
        let unique: HashSet<char> = name.chars().collect();
        assert_eq!(unique.len(), TRANSIENT_NAME_LEN);
    }

    #[test]
    fn test_fixed_naming_is_deterministic() {
        let naming = FixedNaming::new("token", "dir");
        let first = naming.session();
        let second = naming.session();
        assert_eq!(first.date_token, "token");
        assert_eq!(first.directory, std::path::PathBuf::from("dir0"));
        assert_eq!(second.directory, std::path::PathBuf::from("dir1"));
    }
}
