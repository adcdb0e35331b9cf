//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and producing a [`FileRecord`] for every regular file in it.
//!
//! # Features
//!
//! - Depth-first traversal driven by walkdir's explicit stack, so deep trees
//!   never hit the call-stack limit
//! - Entries sorted by file name within each directory for deterministic order
//! - Symlinks skipped by default, optionally followed with loop detection
//! - Sockets, FIFOs and device nodes are always skipped
//! - Hidden file and size filtering
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dupehash::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! walker.validate_root().unwrap();
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::{FileRecord, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Directory walker for file discovery.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback, ticked once per discovered file
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupehash::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// ```
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Root directory this walker starts from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Check that the root exists and is a directory.
    ///
    /// Call this before [`walk`](Self::walk); it touches nothing below the root.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] or [`ScanError::NotADirectory`] for an
    /// unusable root, or another [`ScanError`] if its metadata is unreadable.
    pub fn validate_root(&self) -> Result<(), ScanError> {
        let metadata =
            std::fs::metadata(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }
        Ok(())
    }

    /// Check if a file passes size filters.
    fn passes_size_filter(&self, size: u64) -> bool {
        if let Some(min) = self.config.min_size {
            if size < min {
                return false;
            }
        }
        if let Some(max) = self.config.max_size {
            if size > max {
                return false;
            }
        }
        true
    }

    /// Walk the directory tree, yielding file records.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration; the caller decides whether they are fatal.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupehash::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
    /// println!("Found {} files", files.len());
    /// ```
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let skip_hidden = self.config.skip_hidden;
        let mut discovered = 0usize;

        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !(skip_hidden && entry.depth() > 0 && is_hidden(entry)))
            .take_while(move |_| {
                let stop = self.is_shutdown_requested();
                if stop {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                }
                !stop
            })
            .filter_map(move |entry_result| {
                let result = match entry_result {
                    Ok(entry) => self.process_entry(entry)?,
                    Err(e) => Err(self.convert_error(e)),
                };
                if let (Ok(record), Some(callback)) = (&result, &self.progress_callback) {
                    discovered += 1;
                    callback.on_progress(discovered, record.path.to_string_lossy().as_ref());
                }
                Some(result)
            })
    }

    /// Turn a walkdir entry into a record, or `None` if it is not a wanted file.
    fn process_entry(&self, entry: DirEntry) -> Option<Result<FileRecord, ScanError>> {
        let file_type = entry.file_type();

        if file_type.is_dir() {
            return None;
        }
        if file_type.is_symlink() {
            // Only reachable when not following links.
            log::trace!("Skipping symlink: {}", entry.path().display());
            return None;
        }
        if !file_type.is_file() {
            log::trace!("Skipping special file: {}", entry.path().display());
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(self.convert_error(e))),
        };
        let size = metadata.len();

        if !self.passes_size_filter(size) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                entry.path().display()
            );
            return None;
        }

        Some(Ok(FileRecord::new(entry.into_path(), size)))
    }

    fn convert_error(&self, err: walkdir::Error) -> ScanError {
        let path = err
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if let Some(ancestor) = err.loop_ancestor() {
            let ancestor = ancestor.to_path_buf();
            log::warn!(
                "Symlink loop at {} (points to {})",
                path.display(),
                ancestor.display()
            );
            return ScanError::Loop { path, ancestor };
        }

        let error = match err.into_io_error() {
            Some(io) => ScanError::from_io(&path, io),
            None => ScanError::Io {
                path,
                source: std::io::Error::other("directory walk failed"),
            },
        };
        log::warn!("{}", error);
        error
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
