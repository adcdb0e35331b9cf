//! Configuration layering: defaults, TOML file, environment, CLI flags.

use clap::Parser;
use dupehash::cli::{Cli, OutputFormat};
use dupehash::config::{Config, ConfigError};
use figment::providers::Serialized;
use figment::Figment;
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all DUPEHASH_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("DUPEHASH_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_load_defaults() {
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.io_threads, 1);
    assert_eq!(config.block_size, 64 * 1024);
}

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
io_threads = 8
follow_symlinks = true
block_size = 4096
min_size = 1
output = "csv"
"#,
    )
    .unwrap();

    let config = Config::load(Some(&config_path)).unwrap();

    assert_eq!(config.io_threads, 8);
    assert!(config.follow_symlinks);
    assert_eq!(config.block_size, 4096);
    assert_eq!(config.min_size, Some(1));
    assert_eq!(config.output, OutputFormat::Csv);
    assert!(!config.skip_hidden);
}

#[test]
fn test_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = 8\nskip_hidden = false\n").unwrap();

    std::env::set_var("DUPEHASH_IO_THREADS", "16");
    std::env::set_var("DUPEHASH_SKIP_HIDDEN", "true");
    std::env::set_var("DUPEHASH_OUTPUT", "json");
    let config = Config::load(Some(&config_path));
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.io_threads, 16);
    assert!(config.skip_hidden);
    assert_eq!(config.output, OutputFormat::Json);
}

#[test]
fn test_cli_overrides_env_and_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = 8\noutput = \"csv\"\n").unwrap();
    std::env::set_var("DUPEHASH_IO_THREADS", "16");

    let cli = Cli::try_parse_from([
        "dupehash",
        "/data",
        "--config",
        config_path.to_str().unwrap(),
        "--io-threads",
        "2",
        "--show-paths",
    ])
    .unwrap();
    let config = Config::from_cli(&cli);
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.io_threads, 2);
    assert_eq!(config.output, OutputFormat::Csv);
    assert!(config.show_paths);
}

#[test]
fn test_invalid_values_are_reported() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();

    let bad_type = temp_dir.path().join("bad_type.toml");
    fs::write(&bad_type, "io_threads = \"many\"\n").unwrap();
    assert!(matches!(
        Config::load(Some(&bad_type)),
        Err(ConfigError::Extract(_))
    ));

    let bad_format = temp_dir.path().join("bad_format.toml");
    fs::write(&bad_format, "output = \"tui\"\n").unwrap();
    assert!(Config::load(Some(&bad_format)).is_err());

    let zero = temp_dir.path().join("zero.toml");
    fs::write(&zero, "block_size = 0\n").unwrap();
    assert!(matches!(
        Config::load(Some(&zero)),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("nope.toml");
    assert!(matches!(
        Config::load(Some(&missing)),
        Err(ConfigError::NotFound(_))
    ));
}

#[test]
fn test_printed_config_reloads_identically() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let original = Config {
        io_threads: 3,
        skip_unreadable: true,
        max_size: Some(1_000_000),
        output: OutputFormat::Json,
        ..Config::default()
    };

    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, original.to_toml().unwrap()).unwrap();

    assert_eq!(Config::load(Some(&path)).unwrap(), original);
}
