//! Duplicate finder: walk, hash, group.
//!
//! # Overview
//!
//! [`DuplicateFinder`] drives the single-pass pipeline:
//! 1. **Validate** the root before anything below it is touched
//! 2. **Walk** the tree with [`Walker`]
//! 3. **Hash** every file's full content with [`Hasher`]
//! 4. **Group** by fingerprint into [`DuplicateGroup`]s
//!
//! With `io_threads == 1` (the default) hashing runs on the calling thread
//! straight off the walker. With more threads the walked records are
//! collected first and hashed on a dedicated rayon pool; results are folded
//! back in walk order, so the groups come out identical either way.
//!
//! # Error policy
//!
//! Any walk or hash failure aborts the run with [`FinderError::FileAccess`].
//! Setting [`FinderConfig::skip_unreadable`] logs the failure, records it in
//! [`ScanSummary::errors`] and carries on with the remaining files.
//!
//! On the pool, a failure stops workers from picking up records that come
//! after it in walk order. The reported error is always the earliest one.
//!
//! # Example
//!
//! ```no_run
//! use dupehash::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
//! let (groups, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! println!("{} groups, {} reclaimable", groups.len(), summary.reclaimable_display());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::groups::{DuplicateGroup, FingerprintIndex};
use crate::progress::{ProgressCallback, PHASE_HASHING, PHASE_WALKING};
use crate::scanner::{
    FileRecord, Fingerprint, HashError, Hasher, ScanError, Walker, WalkerConfig,
    DEFAULT_BLOCK_SIZE,
};

/// Threshold for logging large files.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024; // 100MB

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Hashing threads. `1` hashes sequentially on the calling thread.
    pub io_threads: usize,
    /// Skip files that cannot be walked or read instead of aborting.
    pub skip_unreadable: bool,
    /// Read block size for the hasher.
    pub block_size: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("skip_unreadable", &self.skip_unreadable)
            .field("block_size", &self.block_size)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 1,
            skip_unreadable: false,
            block_size: DEFAULT_BLOCK_SIZE,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hashing threads (at least one).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Skip unreadable files instead of aborting.
    #[must_use]
    pub fn with_skip_unreadable(mut self, skip: bool) -> Self {
        self.skip_unreadable = skip;
        self
    }

    /// Set the hasher's read block size.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
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

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Files hashed and indexed
    pub total_files: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Distinct fingerprints seen
    pub unique_fingerprints: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Copies beyond the first in each group
    pub duplicate_files: usize,
    /// Bytes those copies occupy
    pub reclaimable_space: u64,
    /// Files skipped because they could not be walked or read
    pub skipped_files: usize,
    /// Errors behind `skipped_files`
    pub errors: Vec<ScanError>,
    /// Wall-clock duration of the scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        format_size(self.reclaimable_space)
    }

    /// Bytes hashed as a human-readable string.
    #[must_use]
    pub fn hashed_display(&self) -> String {
        format_size(self.bytes_hashed)
    }

    fn record_groups(&mut self, groups: &[DuplicateGroup]) {
        self.duplicate_groups = groups.len();
        self.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        self.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
    }
}

fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The root is missing or not a directory. Nothing was read.
    #[error("'{path}' is not a valid directory")]
    InvalidRoot {
        /// The root that was rejected
        path: PathBuf,
        /// Why it was rejected
        #[source]
        source: ScanError,
    },

    /// A file or directory could not be walked or read.
    #[error(transparent)]
    FileAccess(#[from] ScanError),
}

/// Duplicate finder that runs the walk → hash → group pipeline.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new().with_block_size(config.block_size);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find all groups of identical files under `path`.
    ///
    /// # Errors
    ///
    /// - [`FinderError::InvalidRoot`] if `path` is missing or not a directory
    /// - [`FinderError::FileAccess`] on the first unreadable entry, unless
    ///   `skip_unreadable` is set
    /// - [`FinderError::Interrupted`] if shutdown was requested
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();

        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        walker
            .validate_root()
            .map_err(|source| FinderError::InvalidRoot {
                path: path.to_path_buf(),
                source,
            })?;

        log::info!("Starting duplicate scan of {}", path.display());
        self.check_shutdown()?;

        let mut summary = ScanSummary::default();
        let mut index = FingerprintIndex::new();

        if self.config.io_threads <= 1 {
            self.notify_start(PHASE_HASHING, 0);
            let mut hashed = 0usize;
            for entry in walker.walk() {
                let record = match entry {
                    Ok(record) => record,
                    Err(e) => {
                        self.handle_error(e, &mut summary)?;
                        continue;
                    }
                };
                hashed += 1;
                let result = self.hash_record(&record, hashed);
                self.absorb(&mut index, &mut summary, record, result)?;
            }
            self.notify_end(PHASE_HASHING);
            // The walker stops quietly on shutdown.
            self.check_shutdown()?;
        } else {
            if let Some(ref callback) = self.config.progress_callback {
                walker = walker.with_progress_callback(callback.clone());
            }
            self.notify_start(PHASE_WALKING, 0);
            let mut records = Vec::new();
            for entry in walker.walk() {
                match entry {
                    Ok(record) => records.push(record),
                    Err(e) => self.handle_error(e, &mut summary)?,
                }
            }
            self.notify_end(PHASE_WALKING);
            self.check_shutdown()?;
            log::info!("Found {} files", records.len());

            self.hash_in_parallel(records, &mut index, &mut summary)?;
        }

        let groups = self.finish(index, &mut summary);
        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    /// Hash and group an explicit list of records, skipping the walk.
    ///
    /// # Errors
    ///
    /// Same as [`find_duplicates`](Self::find_duplicates), minus root validation.
    pub fn find_duplicates_from_records(
        &self,
        records: Vec<FileRecord>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();
        let mut index = FingerprintIndex::new();

        self.check_shutdown()?;
        if self.config.io_threads <= 1 {
            self.notify_start(PHASE_HASHING, records.len());
            for (idx, record) in records.into_iter().enumerate() {
                let result = self.hash_record(&record, idx + 1);
                self.absorb(&mut index, &mut summary, record, result)?;
            }
            self.notify_end(PHASE_HASHING);
        } else {
            self.hash_in_parallel(records, &mut index, &mut summary)?;
        }

        let groups = self.finish(index, &mut summary);
        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    fn hash_in_parallel(
        &self,
        records: Vec<FileRecord>,
        index: &mut FingerprintIndex,
        summary: &mut ScanSummary,
    ) -> Result<(), FinderError> {
        self.notify_start(PHASE_HASHING, records.len());
        log::info!(
            "Hashing {} files on {} threads",
            records.len(),
            self.config.io_threads
        );

        // Lowest walk index whose failure ends the run; later records are left unhashed.
        let first_failure = AtomicUsize::new(usize::MAX);
        let counter = AtomicUsize::new(0);
        let hash_one = |(idx, record): (usize, FileRecord)| {
            if idx > first_failure.load(Ordering::Acquire) {
                return (record, None);
            }
            let current = counter.fetch_add(1, Ordering::Relaxed) + 1;
            let result = self.hash_record(&record, current);
            if let Err(ref e) = result {
                if !self.config.skip_unreadable || matches!(e, HashError::Interrupted(_)) {
                    first_failure.fetch_min(idx, Ordering::AcqRel);
                }
            }
            (record, Some(result))
        };

        // collect() on an indexed parallel iterator keeps input order.
        let results: Vec<(FileRecord, Option<Result<Fingerprint, HashError>>)> =
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.io_threads)
                .build()
            {
                Ok(pool) => pool.install(|| {
                    records
                        .into_par_iter()
                        .enumerate()
                        .map(hash_one)
                        .collect()
                }),
                Err(e) => {
                    log::warn!("Failed to create hashing thread pool, hashing sequentially: {e}");
                    records.into_iter().enumerate().map(hash_one).collect()
                }
            };

        self.notify_end(PHASE_HASHING);
        self.check_shutdown()?;

        // Every record before the earliest failure was hashed, so the fold
        // stops on the same error a sequential run would.
        for (record, result) in results {
            let Some(result) = result else { continue };
            self.absorb(index, summary, record, result)?;
        }
        Ok(())
    }

    fn hash_record(&self, record: &FileRecord, current: usize) -> Result<Fingerprint, HashError> {
        if record.size > LARGE_FILE_THRESHOLD {
            log::debug!(
                "Hashing large file ({} MB): {}",
                record.size / (1024 * 1024),
                record.path.display()
            );
        }
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_progress(current, record.path.to_string_lossy().as_ref());
        }

        let result = self.hasher.hash_file(&record.path);
        if result.is_ok() {
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_item_completed(record.size);
            }
        }
        result
    }

    fn absorb(
        &self,
        index: &mut FingerprintIndex,
        summary: &mut ScanSummary,
        record: FileRecord,
        result: Result<Fingerprint, HashError>,
    ) -> Result<(), FinderError> {
        match result {
            Ok(fingerprint) => {
                summary.bytes_hashed += record.size;
                index.insert(record, fingerprint);
                Ok(())
            }
            Err(e) => self.handle_error(ScanError::Hash(e), summary),
        }
    }

    /// Apply the error policy to one failed entry.
    fn handle_error(&self, err: ScanError, summary: &mut ScanSummary) -> Result<(), FinderError> {
        if matches!(err, ScanError::Hash(HashError::Interrupted(_))) {
            return Err(FinderError::Interrupted);
        }
        self.check_shutdown()?;

        // A cycle is not a read failure; the walker already refused to re-enter it.
        if matches!(err, ScanError::Loop { .. }) {
            summary.errors.push(err);
            return Ok(());
        }

        if !self.config.skip_unreadable {
            log::error!("Aborting scan: {}", err);
            return Err(FinderError::FileAccess(err));
        }

        log::warn!("Skipping unreadable entry: {}", err);
        summary.skipped_files += 1;
        summary.errors.push(err);
        Ok(())
    }

    fn finish(&self, index: FingerprintIndex, summary: &mut ScanSummary) -> Vec<DuplicateGroup> {
        let (groups, stats) = index.into_duplicate_groups();
        summary.total_files = stats.total_files;
        summary.unique_fingerprints = stats.unique_fingerprints;
        summary.record_groups(&groups);

        log::info!(
            "Scan complete: {} files, {} groups, {} duplicates, {} reclaimable",
            summary.total_files,
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );
        groups
    }

    fn check_shutdown(&self) -> Result<(), FinderError> {
        if self.config.is_shutdown_requested() {
            log::info!("Scan interrupted by shutdown signal");
            return Err(FinderError::Interrupted);
        }
        Ok(())
    }

    fn notify_start(&self, phase: &str, total: usize) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(phase, total);
        }
    }

    fn notify_end(&self, phase: &str) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(phase);
        }
    }
}
