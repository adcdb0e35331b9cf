//! SHA-256 file hasher with streaming support.
//!
//! # Overview
//!
//! [`Hasher`] reads a file in fixed-size blocks (64 KiB by default) and
//! feeds each block into an incremental SHA-256 digest, so peak memory is
//! bounded by the block size no matter how large the file is. The result
//! is a [`Fingerprint`]: the lowercase hexadecimal digest.
//!
//! # Example
//!
//! ```no_run
//! use dupehash::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new().with_block_size(128 * 1024);
//! let fingerprint = hasher.hash_file(Path::new("Cargo.toml")).unwrap();
//! assert_eq!(fingerprint.as_str().len(), 64);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::HashError;

/// Default read block size in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Largest read block accepted; bigger requests are clamped.
pub const MAX_BLOCK_SIZE: usize = 64 * 1024 * 1024;

/// Hex digest of a file's full content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a finished digest.
    fn from_digest(digest: impl fmt::LowerHex) -> Self {
        Self(format!("{digest:x}"))
    }

    /// The 64-character lowercase hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    block_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with [`DEFAULT_BLOCK_SIZE`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            shutdown_flag: None,
        }
    }

    /// Set the read block size, clamped to `1..=MAX_BLOCK_SIZE`.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.clamp(1, MAX_BLOCK_SIZE);
        self
    }

    /// Set the shutdown flag checked between blocks.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Configured block size in bytes.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Compute the fingerprint of the file at `path`.
    ///
    /// The file is opened, streamed to the end and closed before this
    /// returns, including when a read fails partway through.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened, a read fails,
    /// or shutdown is requested mid-stream.
    pub fn hash_file(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let fingerprint = self.hash_stream(file, path)?;
        log::trace!("Hashed {} -> {}", path.display(), fingerprint.short());
        Ok(fingerprint)
    }

    /// Compute the fingerprint of an arbitrary byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Io`] if a read fails.
    pub fn hash_reader<R: Read>(&self, reader: R) -> Result<Fingerprint, HashError> {
        self.hash_stream(reader, Path::new("<reader>"))
    }

    fn hash_stream<R: Read>(&self, mut reader: R, path: &Path) -> Result<Fingerprint, HashError> {
        let mut digest = Sha256::new();
        let mut buf = vec![0u8; self.block_size];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            digest.update(&buf[..n]);
        }

        Ok(Fingerprint::from_digest(digest.finalize()))
    }
}
