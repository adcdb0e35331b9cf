//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Deterministic directory walking using walkdir
//! - Streaming SHA-256 content fingerprints
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: SHA-256 file hashing (streaming, fixed-size blocks)
//!
//! # Example
//!
//! ```no_run
//! use dupehash::scanner::{Hasher, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let hasher = Hasher::new();
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => match hasher.hash_file(&file.path) {
//!             Ok(fp) => println!("{}  {}", fp, file.name),
//!             Err(e) => eprintln!("Warning: {}", e),
//!         },
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};

use serde::Serialize;

// Re-export main types
pub use hasher::{Fingerprint, Hasher, DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE};
pub use walker::Walker;

/// A regular file discovered by the walker.
///
/// The display name is the base file name rendered as UTF-8. Byte
/// sequences that are not valid UTF-8 are replaced with `U+FFFD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path as discovered (root joined with the relative location)
    pub path: PathBuf,
    /// Base file name used in reports
    pub name: String,
    /// File size in bytes at discovery time
    pub size: u64,
}

impl FileRecord {
    /// Create a record, deriving the display name from the path.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        let name = display_name(&path);
        Self { path, name, size }
    }
}

/// Base name of `path` as lossy UTF-8, falling back to the whole path.
#[must_use]
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Configuration for directory walking.
///
/// The defaults yield every regular file under the root and skip symlinks.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Cycles are detected and reported instead of descended.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,
}

impl WalkerConfig {
    /// Create a new configuration from CLI arguments.
    #[must_use]
    pub fn new(
        follow_symlinks: bool,
        skip_hidden: bool,
        min_size: Option<u64>,
        max_size: Option<u64>,
    ) -> Self {
        Self {
            follow_symlinks,
            skip_hidden,
            min_size,
            max_size,
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A symbolic link points back to one of its ancestors.
    #[error("Symlink loop: {path} points to ancestor {ancestor}")]
    Loop {
        /// The link that closes the cycle
        path: PathBuf,
        /// The directory it points back to
        ancestor: PathBuf,
    },

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing a discovered file failed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl ScanError {
    /// Classify an I/O error for `path` the same way the walker and hasher do.
    #[must_use]
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        match HashError::from_io(path, source) {
            HashError::NotFound(p) => Self::NotFound(p),
            HashError::PermissionDenied(p) => Self::PermissionDenied(p),
            HashError::Io { path, source } => Self::Io { path, source },
            other @ HashError::Interrupted(_) => Self::Hash(other),
        }
    }

    /// Path the error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::NotADirectory(p) => Some(p),
            Self::Loop { path, .. } | Self::Io { path, .. } => Some(path),
            Self::Hash(e) => e.path(),
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),
}

impl HashError {
    /// Classify an I/O error for `path` by its kind.
    #[must_use]
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Interrupted(p) => Some(p),
            Self::Io { path, .. } => Some(path),
        }
    }
}
