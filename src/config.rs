//! Application configuration management.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed `DUPEHASH_` (e.g. `DUPEHASH_IO_THREADS=4`)
//! 4. Command-line flags

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::{Cli, OutputFormat};
use crate::duplicates::FinderConfig;
use crate::scanner::{WalkerConfig, DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE};

/// Prefix of environment variables read into [`Config`].
pub const ENV_PREFIX: &str = "DUPEHASH_";

/// Errors raised while assembling the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer held a value of the wrong type or an unknown variant.
    #[error("Invalid configuration: {0}")]
    Extract(#[from] figment::Error),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The effective configuration could not be rendered as TOML.
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Effective settings for one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Read block size for hashing, in bytes.
    pub block_size: u64,
    /// Hashing threads; 1 hashes sequentially.
    pub io_threads: usize,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Skip dot-files and dot-directories.
    pub skip_hidden: bool,
    /// Skip unreadable files instead of aborting.
    pub skip_unreadable: bool,
    /// Ignore files smaller than this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,
    /// Ignore files larger than this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    /// Print full paths in the text report.
    pub show_paths: bool,
    /// Report format.
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE as u64,
            io_threads: 1,
            follow_symlinks: false,
            skip_hidden: false,
            skip_unreadable: false,
            min_size: None,
            max_size: None,
            show_paths: false,
            output: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Platform-specific location of `config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupehash", "dupehash")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Figment with defaults, the TOML file at `path` and the environment.
    ///
    /// A missing file contributes nothing.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load defaults, file and environment layers.
    ///
    /// An explicit `path` must exist; the platform default may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit file is missing or any
    /// layer holds invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Some(path.to_path_buf())
            }
            None => Self::default_path(),
        };

        if let Some(ref file) = file {
            log::debug!("Reading configuration from {}", file.display());
        }

        let config: Config = Self::figment(file.as_deref()).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load every layer, finishing with the command-line flags.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self::load(cli.config.as_deref())?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Overlay values given on the command line.
    ///
    /// Switches can only turn a setting on.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(output) = cli.output {
            self.output = output;
        }
        if let Some(threads) = cli.io_threads {
            self.io_threads = threads as usize;
        }
        if let Some(block_size) = cli.block_size {
            self.block_size = block_size;
        }
        if cli.min_size.is_some() {
            self.min_size = cli.min_size;
        }
        if cli.max_size.is_some() {
            self.max_size = cli.max_size;
        }
        self.follow_symlinks |= cli.follow_symlinks;
        self.skip_hidden |= cli.skip_hidden;
        self.skip_unreadable |= cli.skip_unreadable;
        self.show_paths |= cli.show_paths;
    }

    /// Reject out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid("io_threads must be at least 1".into()));
        }
        if self.block_size == 0 {
            return Err(ConfigError::Invalid("block_size must be at least 1".into()));
        }
        if self.block_size > MAX_BLOCK_SIZE as u64 {
            return Err(ConfigError::Invalid(format!(
                "block_size {} exceeds the maximum of {} bytes",
                self.block_size, MAX_BLOCK_SIZE
            )));
        }
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if min > max {
                return Err(ConfigError::Invalid(format!(
                    "min_size ({min}) is greater than max_size ({max})"
                )));
            }
        }
        Ok(())
    }

    /// Render as TOML, as printed by `--print-config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Walker settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(
            self.follow_symlinks,
            self.skip_hidden,
            self.min_size,
            self.max_size,
        )
    }

    /// Finder settings derived from this configuration.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_skip_unreadable(self.skip_unreadable)
            .with_block_size(usize::try_from(self.block_size).unwrap_or(DEFAULT_BLOCK_SIZE))
            .with_walker_config(self.walker_config())
    }
}
