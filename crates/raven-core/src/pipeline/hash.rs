//! Content hashing of written variant files.
//!
//! Digests are integrity fingerprints only; nothing is addressed by them.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Streaming MD5 hasher with a bounded read size.
#[derive(Debug, Clone, Copy)]
pub struct Hasher {
    chunk_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(8192)
    }
}

impl Hasher {
    /// Create a hasher reading at most `chunk_size` bytes at a time.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Hex MD5 of a whole file.
    ///
    /// Callers must only pass files whose writer has already been flushed and
    /// closed.
    pub fn content_hash(&self, path: &Path) -> std::io::Result<String> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut context = md5::Context::new();

        let mut buffer = vec![0u8; self.chunk_size];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            context.consume(&buffer[..bytes_read]);
        }

        Ok(format!("{:x}", context.compute()))
    }

    /// Hex MD5 of an in-memory buffer.
    pub fn content_hash_from_bytes(data: &[u8]) -> String {
        format!("{:x}", md5::compute(data))
    }
}
