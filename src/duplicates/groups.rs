//! Fingerprint grouping and duplicate group management.
//!
//! # Overview
//!
//! Every hashed file lands in a [`FingerprintIndex`], keyed by its
//! [`Fingerprint`]. The index remembers the order in which fingerprints were
//! first seen and the order in which files joined each entry, so the
//! resulting [`DuplicateGroup`]s list files in discovery order.
//!
//! Only entries with two or more files become duplicate groups. Because the
//! key is a digest of the full content, every group is maximal: no file
//! outside it shares its fingerprint.
//!
//! # Example
//!
//! ```
//! use dupehash::duplicates::group_by_fingerprint;
//! use dupehash::scanner::{FileRecord, Hasher};
//! use std::path::PathBuf;
//!
//! let hasher = Hasher::new();
//! let hashed = [("a.txt", "hello"), ("b.txt", "hello"), ("c.txt", "world")]
//!     .into_iter()
//!     .map(|(name, content)| {
//!         let fp = hasher.hash_reader(content.as_bytes()).unwrap();
//!         (FileRecord::new(PathBuf::from(name), content.len() as u64), fp)
//!     });
//!
//! let (groups, stats) = group_by_fingerprint(hashed);
//!
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].names(), vec!["a.txt", "b.txt"]);
//! assert_eq!(stats.eliminated_unique, 1);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::scanner::{FileRecord, Fingerprint};

/// Confirmed group of files with byte-identical content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// SHA-256 of the shared content
    pub fingerprint: Fingerprint,
    /// Size of each member in bytes
    pub size: u64,
    /// Members in discovery order
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(fingerprint: Fingerprint, files: Vec<FileRecord>) -> Self {
        let size = files.first().map_or(0, |f| f.size);
        Self {
            fingerprint,
            size,
            files,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Display names of the members, in discovery order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_str()).collect()
    }

    /// Paths of the members, in discovery order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Bytes that all copies beyond the first occupy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }
}

/// Statistics from the grouping step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Files that went into the index
    pub total_files: usize,
    /// Sum of their sizes
    pub total_size: u64,
    /// Distinct fingerprints seen
    pub unique_fingerprints: usize,
    /// Fingerprints held by exactly one file
    pub eliminated_unique: usize,
    /// Groups with 2+ files
    pub duplicate_groups: usize,
    /// Files that ended up in a group
    pub grouped_files: usize,
}

/// Insertion-ordered map from fingerprint to the files that share it.
#[derive(Debug, Default)]
pub struct FingerprintIndex {
    positions: HashMap<Fingerprint, usize>,
    entries: Vec<(Fingerprint, Vec<FileRecord>)>,
    total_size: u64,
    total_files: usize,
}

impl FingerprintIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` to the entry for `fingerprint`, creating it on first sight.
    pub fn insert(&mut self, record: FileRecord, fingerprint: Fingerprint) {
        self.total_files += 1;
        self.total_size += record.size;

        if let Some(&pos) = self.positions.get(&fingerprint) {
            self.entries[pos].1.push(record);
            return;
        }
        self.positions.insert(fingerprint.clone(), self.entries.len());
        self.entries.push((fingerprint, vec![record]));
    }

    /// Number of distinct fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep entries with more than one file, in first-seen order.
    #[must_use]
    pub fn into_duplicate_groups(self) -> (Vec<DuplicateGroup>, GroupingStats) {
        let mut stats = GroupingStats {
            total_files: self.total_files,
            total_size: self.total_size,
            unique_fingerprints: self.entries.len(),
            ..Default::default()
        };

        let groups: Vec<DuplicateGroup> = self
            .entries
            .into_iter()
            .filter_map(|(fingerprint, files)| {
                if files.len() < 2 {
                    stats.eliminated_unique += 1;
                    return None;
                }
                log::debug!(
                    "Duplicate group {}: {} files, {} bytes each",
                    fingerprint.short(),
                    files.len(),
                    files[0].size
                );
                stats.duplicate_groups += 1;
                stats.grouped_files += files.len();
                Some(DuplicateGroup::new(fingerprint, files))
            })
            .collect();

        (groups, stats)
    }
}

/// Group already-hashed files by fingerprint.
///
/// Returns only groups with two or more members, ordered by when their
/// fingerprint was first seen, together with [`GroupingStats`].
#[must_use]
pub fn group_by_fingerprint(
    hashed: impl IntoIterator<Item = (FileRecord, Fingerprint)>,
) -> (Vec<DuplicateGroup>, GroupingStats) {
    let mut index = FingerprintIndex::new();
    for (record, fingerprint) in hashed {
        index.insert(record, fingerprint);
    }
    index.into_duplicate_groups()
}
