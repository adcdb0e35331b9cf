//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Grouping hashed files by content fingerprint
//! - Running the walk → hash → group pipeline

pub mod finder;
pub mod groups;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{group_by_fingerprint, DuplicateGroup, FingerprintIndex, GroupingStats};
