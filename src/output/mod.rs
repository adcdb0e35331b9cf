//! Output formatters for duplicate scan results.
//!
//! - [`text`]: the human-readable listing (default)
//! - [`json`]: JSON for automation and scripting
//! - [`csv`]: CSV for spreadsheet import
//!
//! Formatters only read the groups they are given.
//!
//! # Example
//!
//! ```no_run
//! use dupehash::duplicates::DuplicateFinder;
//! use dupehash::output::TextOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! TextOutput::new(&groups).write_to(std::io::stdout().lock()).unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod text;

// Re-export main types
pub use self::csv::CsvOutput;
pub use json::JsonOutput;
pub use text::TextOutput;

/// Errors that can occur while writing a report.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}
