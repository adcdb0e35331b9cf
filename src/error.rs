//! Structured error handling and exit codes.

use serde::Serialize;

use crate::duplicates::FinderError;

/// Process exit codes.
///
/// - 0: Success (scan completed, whether or not duplicates were found)
/// - 1: General error (file access failure or other unexpected failure)
/// - 2: Usage error (bad command line, see [`ExitCode::for_clap_error`])
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Scan completed normally.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// The command line could not be parsed.
    UsageError = 2,
    /// Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DH000",
            Self::GeneralError => "DH001",
            Self::UsageError => "DH002",
            Self::Interrupted => "DH130",
        }
    }

    /// Pick the exit code for a failed command-line parse.
    ///
    /// `--help` and `--version` also surface as clap errors but go to stdout
    /// and succeed.
    #[must_use]
    pub fn for_clap_error(err: &clap::Error) -> Self {
        if err.use_stderr() {
            Self::UsageError
        } else {
            Self::Success
        }
    }

    /// Pick the exit code for an error that escaped `run_app`.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DH001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
