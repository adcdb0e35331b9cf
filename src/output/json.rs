//! JSON output formatter for duplicate scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "fingerprint": "2cf24dba...",
//!       "size": 5,
//!       "names": ["foo.txt", "bar.txt"],
//!       "files": ["/data/foo.txt", "/data/sub/bar.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "total_files": 3,
//!     "bytes_hashed": 15,
//!     "duplicate_groups": 1,
//!     "duplicate_files": 1,
//!     "reclaimable_space": 5,
//!     "skipped_files": 0,
//!     "scan_duration_ms": 2,
//!     "exit_code": 0,
//!     "exit_code_name": "DH000"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use super::OutputError;
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// SHA-256 as hexadecimal string (64 characters)
    pub fingerprint: String,
    /// File size in bytes
    pub size: u64,
    /// Display names, in discovery order
    pub names: Vec<String>,
    /// Paths, in the same order as `names`
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            fingerprint: group.fingerprint.to_string(),
            size: group.size,
            names: group.files.iter().map(|f| f.name.clone()).collect(),
            files: group
                .files
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files hashed
    pub total_files: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Copies beyond the first in each group
    pub duplicate_files: usize,
    /// Bytes those copies occupy
    pub reclaimable_space: u64,
    /// Entries skipped as unreadable
    pub skipped_files: usize,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DH000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            bytes_hashed: summary.bytes_hashed,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            skipped_files: summary.skipped_files,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// List of duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document from groups, summary and exit code.
    ///
    /// # Example
    ///
    /// ```
    /// use dupehash::duplicates::ScanSummary;
    /// use dupehash::error::ExitCode;
    /// use dupehash::output::JsonOutput;
    ///
    /// let output = JsonOutput::new(&[], &ScanSummary::default(), ExitCode::Success);
    /// assert!(output.to_json().unwrap().starts_with('{'));
    /// ```
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            duplicates: groups.iter().map(JsonDuplicateGroup::from).collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W, pretty: bool) -> Result<(), OutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
