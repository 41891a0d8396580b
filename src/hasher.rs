//! Content fingerprinting for duplicate detection.
//!
//! Files are streamed through SHA-256 in fixed-size chunks so memory stays
//! bounded regardless of file size. Two files count as identical only when
//! both their size and their fingerprint match; the size check is the
//! caller's cheap pre-filter.

use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read chunk size for streaming hashes.
const CHUNK_SIZE: usize = 4096;

/// A hex-encoded SHA-256 digest of a file's content.
pub type Fingerprint = String;

/// Computes content fingerprints.
pub struct ContentHasher;

impl ContentHasher {
    /// Stream the file and return its content fingerprint.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error if the file becomes unreadable
    /// (permissions change, deletion race). Callers skip the file and record
    /// the error; a hash failure is never fatal to a run.
    pub fn fingerprint(path: &Path) -> io::Result<Fingerprint> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        let mut chunk = [0u8; CHUNK_SIZE];

        loop {
            let n = file.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            hasher.update(&chunk[..n]);
        }

        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            let _ = write!(hex, "{:02x}", byte);
        }
        Ok(hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_identical_content_same_fingerprint() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        fs::write(&a, b"same bytes").unwrap();
        fs::write(&b, b"same bytes").unwrap();

        assert_eq!(
            ContentHasher::fingerprint(&a).unwrap(),
            ContentHasher::fingerprint(&b).unwrap()
        );
    }

    #[test]
    fn test_different_content_different_fingerprint() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        fs::write(&a, b"one").unwrap();
        fs::write(&b, b"two").unwrap();

        assert_ne!(
            ContentHasher::fingerprint(&a).unwrap(),
            ContentHasher::fingerprint(&b).unwrap()
        );
    }

    #[test]
    fn test_known_digest_for_empty_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let empty = temp_dir.path().join("empty");
        fs::write(&empty, b"").unwrap();

        // SHA-256 of the empty string.
        assert_eq!(
            ContentHasher::fingerprint(&empty).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_file_larger_than_chunk_size() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let big = temp_dir.path().join("big.bin");
        fs::write(&big, vec![0xAB; CHUNK_SIZE * 3 + 17]).unwrap();

        let fp = ContentHasher::fingerprint(&big).unwrap();
        assert_eq!(fp.len(), 64);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("missing");

        assert!(ContentHasher::fingerprint(&missing).is_err());
    }
}
