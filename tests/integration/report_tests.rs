//! End-to-end runs of `scan_and_report` against temporary trees.

use clap::Parser;
use dupehash::cli::Cli;
use dupehash::config::Config;
use dupehash::error::ExitCode;
use dupehash::{scan_and_report, ReportOptions};
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

struct Run {
    code: ExitCode,
    stdout: String,
    stderr: String,
}

fn run(args: &[&str]) -> anyhow::Result<Run> {
    let mut argv = vec!["dupehash"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();

    let mut config = Config::default();
    config.apply_cli(&cli);

    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = scan_and_report(
        &cli,
        &config,
        Arc::new(AtomicBool::new(false)),
        ReportOptions::default(),
        &mut out,
        &mut err,
    )?;
    Ok(Run {
        code,
        stdout: String::from_utf8(out).unwrap(),
        stderr: String::from_utf8(err).unwrap(),
    })
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_text_report_lists_duplicate_names() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("foo.txt"), "hello").unwrap();
    fs::write(dir.path().join("bar.txt"), "hello").unwrap();
    fs::write(dir.path().join("baz.txt"), "world").unwrap();

    let result = run(&[path_arg(dir.path())]).unwrap();

    assert_eq!(result.code, ExitCode::Success);
    assert_eq!(result.stdout, "Duplicate files:\n• bar.txt\n• foo.txt\n\n");
    assert!(result.stderr.is_empty());
}

#[test]
fn test_text_report_with_paths() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("a"), "same").unwrap();
    fs::write(dir.path().join("sub").join("b"), "same").unwrap();

    let result = run(&[path_arg(dir.path()), "--show-paths"]).unwrap();

    let expected = format!(
        "Duplicate files:\n• {}\n• {}\n\n",
        dir.path().join("a").display(),
        dir.path().join("sub").join("b").display()
    );
    assert_eq!(result.stdout, expected);
}

#[test]
fn test_no_duplicates_prints_nothing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("one"), "1").unwrap();
    fs::write(dir.path().join("two"), "2").unwrap();

    let result = run(&[path_arg(dir.path())]).unwrap();
    assert_eq!(result.code, ExitCode::Success);
    assert!(result.stdout.is_empty());
}

#[test]
fn test_invalid_root_reports_and_exits_cleanly() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("regular.txt");
    fs::write(&file, "data").unwrap();

    let result = run(&[path_arg(&file)]).unwrap();

    assert_eq!(result.code, ExitCode::Success);
    assert!(result.stdout.is_empty());
    assert_eq!(
        result.stderr,
        format!("Error: '{}' is not a valid directory.\n", file.display())
    );
}

#[test]
fn test_missing_root_reports_and_exits_cleanly() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("gone");

    let result = run(&[path_arg(&missing)]).unwrap();

    assert_eq!(result.code, ExitCode::Success);
    assert!(result.stderr.contains("is not a valid directory."));
}

#[test]
fn test_json_report() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "").unwrap();
    fs::write(dir.path().join("b.txt"), "").unwrap();
    fs::write(dir.path().join("c.txt"), "x").unwrap();

    let result = run(&[path_arg(dir.path()), "--output", "json"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&result.stdout).unwrap();

    assert_eq!(value["duplicates"].as_array().unwrap().len(), 1);
    assert_eq!(
        value["duplicates"][0]["names"],
        serde_json::json!(["a.txt", "b.txt"])
    );
    assert_eq!(value["duplicates"][0]["size"], 0);
    assert_eq!(value["summary"]["total_files"], 3);
    assert_eq!(value["summary"]["exit_code_name"], "DH000");
}

#[test]
fn test_csv_report() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("x1"), "abc").unwrap();
    fs::write(dir.path().join("x2"), "abc").unwrap();

    let result = run(&[path_arg(dir.path()), "-o", "csv"]).unwrap();
    let lines: Vec<&str> = result.stdout.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "group_id,fingerprint,name,path,size");
    assert!(lines[1].contains(",x1,"));
    assert!(lines[2].contains(",x2,"));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_fails_the_run() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "same").unwrap();
    let locked = dir.path().join("b");
    fs::write(&locked, "same").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::File::open(&locked).is_ok() {
        return;
    }

    let err = match run(&[path_arg(dir.path())]) {
        Ok(_) => panic!("expected the scan to fail"),
        Err(err) => err,
    };
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);

    let hardened = run(&[path_arg(dir.path()), "--skip-unreadable"]).unwrap();
    assert_eq!(hardened.code, ExitCode::Success);
    assert!(hardened.stdout.is_empty());
}
