//! CSV output formatter for duplicate scan results.
//!
//! One row is generated for each member of each duplicate group.
//!
//! # Columns
//!
//! - `group_id`: 1-based group number, in report order
//! - `fingerprint`: SHA-256 content hash (hexadecimal)
//! - `name`: display name
//! - `path`: path as discovered
//! - `size`: file size in bytes

use std::io;

use serde::Serialize;

use super::OutputError;
use crate::duplicates::DuplicateGroup;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    group_id: usize,
    fingerprint: &'a str,
    name: &'a str,
    path: String,
    size: u64,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `OutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), OutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for (idx, group) in self.groups.iter().enumerate() {
            for file in &group.files {
                csv_writer.serialize(CsvRow {
                    group_id: idx + 1,
                    fingerprint: group.fingerprint.as_str(),
                    name: &file.name,
                    path: file.path.to_string_lossy().into_owned(),
                    size: file.size,
                })?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `OutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, OutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
