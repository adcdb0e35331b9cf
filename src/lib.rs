//! dupehash - content-hash duplicate file finder
//!
//! Walks a directory tree, hashes every regular file with SHA-256 and lists
//! the files whose contents are byte-for-byte identical.
//!
//! The pipeline is available as a library:
//!
//! ```no_run
//! use dupehash::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
//! let (groups, summary) = finder.find_duplicates(Path::new("/data")).unwrap();
//! for group in &groups {
//!     println!("{}: {:?}", group.fingerprint.short(), group.names());
//! }
//! println!("{} reclaimable", summary.reclaimable_display());
//! ```

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};

use cli::{Cli, OutputFormat};
use config::Config;
use duplicates::{DuplicateFinder, FinderError};
use error::ExitCode;
use output::{CsvOutput, JsonOutput, TextOutput};
use progress::Progress;

/// Run the binary: logging, configuration, signal handling, then the scan.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the scan fails on an
/// unreadable file, the scan is interrupted, or the report cannot be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::from_cli(&cli).context("Failed to load configuration")?;
    log::debug!("Effective configuration: {:?}", config);

    if cli.print_config {
        let rendered = config.to_toml()?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()?;
        return Ok(ExitCode::Success);
    }

    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;

    let show_progress =
        !cli.quiet && config.output == OutputFormat::Text && io::stderr().is_terminal();
    let color = !cli.no_color && io::stdout().is_terminal();

    let options = ReportOptions {
        show_progress,
        color,
    };
    scan_and_report(
        &cli,
        &config,
        handler.get_flag(),
        options,
        io::stdout().lock(),
        io::stderr(),
    )
}

/// Terminal-dependent switches for [`scan_and_report`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Draw progress bars on stderr.
    pub show_progress: bool,
    /// Bold the text report headers.
    pub color: bool,
}

/// Scan `cli.path` with `config` and write the report to `out`.
///
/// An invalid root is reported on `err` and still yields
/// [`ExitCode::Success`]; nothing under it is read.
///
/// # Errors
///
/// Propagates [`FinderError::FileAccess`] and [`FinderError::Interrupted`],
/// and any failure to write the report.
pub fn scan_and_report<W: Write, E: Write>(
    cli: &Cli,
    config: &Config,
    shutdown_flag: Arc<AtomicBool>,
    options: ReportOptions,
    mut out: W,
    mut err: E,
) -> Result<ExitCode> {
    let mut finder_config = config.finder_config().with_shutdown_flag(shutdown_flag);
    if options.show_progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let finder = DuplicateFinder::new(finder_config);
    let (groups, summary) = match finder.find_duplicates(&cli.path) {
        Ok(result) => result,
        Err(FinderError::InvalidRoot { path, source }) => {
            log::debug!("Rejected root: {}", source);
            writeln!(err, "Error: '{}' is not a valid directory.", path.display())?;
            err.flush()?;
            return Ok(ExitCode::Success);
        }
        Err(e) => return Err(e.into()),
    };

    log::info!(
        "Hashed {} files ({}), {} duplicate groups, {} reclaimable in {:.2?}",
        summary.total_files,
        summary.hashed_display(),
        summary.duplicate_groups,
        summary.reclaimable_display(),
        summary.scan_duration
    );
    for skipped in &summary.errors {
        log::debug!("Not scanned: {}", skipped);
    }

    match config.output {
        OutputFormat::Text => TextOutput::new(&groups)
            .with_paths(config.show_paths)
            .with_color(options.color)
            .write_to(&mut out)
            .context("Failed to write report")?,
        OutputFormat::Json => JsonOutput::new(&groups, &summary, ExitCode::Success)
            .write_to(&mut out, true)
            .context("Failed to write JSON report")?,
        OutputFormat::Csv => CsvOutput::new(&groups)
            .write_to(&mut out)
            .context("Failed to write CSV report")?,
    }

    Ok(ExitCode::Success)
}
