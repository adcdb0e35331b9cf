use dupehash::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupehash::scanner::{ScanError, WalkerConfig};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(content).unwrap();
}

fn names(group: &dupehash::duplicates::DuplicateGroup) -> Vec<&str> {
    group.names()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"content a");
    write(&dir.path().join("b.txt"), b"content b");
    write(&dir.path().join("c.txt"), b"content c");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.unique_fingerprints, 3);
}

#[test]
fn test_scan_simple_duplicates() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("foo.txt"), b"hello");
    write(&dir.path().join("bar.txt"), b"hello");
    write(&dir.path().join("baz.txt"), b"world");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(names(&groups[0]), vec!["bar.txt", "foo.txt"]);
    assert_eq!(
        groups[0].fingerprint.as_str(),
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 5);
}

#[test]
fn test_scan_groups_empty_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"");
    write(&dir.path().join("b.txt"), b"");
    write(&dir.path().join("c.txt"), b"x");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(names(&groups[0]), vec!["a.txt", "b.txt"]);
    assert_eq!(groups[0].size, 0);
    assert_eq!(
        groups[0].fingerprint.as_str(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("top.bin"), b"dup");
    write(&dir.path().join("one/two/deep.bin"), b"dup");
    write(&dir.path().join("other/side.bin"), b"dup");
    write(&dir.path().join("other/alone.bin"), b"solo");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 3);
    let paths = groups[0].paths();
    assert!(paths.contains(&dir.path().join("one/two/deep.bin")));
    assert!(paths.contains(&dir.path().join("other/side.bin")));
    assert!(paths.contains(&dir.path().join("top.bin")));
    assert_eq!(summary.total_files, 4);
}

#[test]
fn test_same_name_in_different_directories_is_listed_twice() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("x/report.pdf"), b"same bytes");
    write(&dir.path().join("y/report.pdf"), b"same bytes");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(names(&groups[0]), vec!["report.pdf", "report.pdf"]);
}

#[test]
fn test_scan_file_instead_of_directory() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("file.txt");
    write(&file_path, b"not a dir");

    let finder = DuplicateFinder::with_defaults();
    match finder.find_duplicates(&file_path) {
        Err(FinderError::InvalidRoot { path, source }) => {
            assert_eq!(path, file_path);
            assert!(matches!(source, ScanError::NotADirectory(_)));
        }
        other => panic!("Expected InvalidRoot, got {:?}", other),
    }
}

#[test]
fn test_scan_non_existent_path() {
    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(Path::new("/non/existent/path/12345"));

    match result {
        Err(FinderError::InvalidRoot { path, source }) => {
            assert!(path.to_string_lossy().contains("non/existent/path/12345"));
            assert!(matches!(source, ScanError::NotFound(_)));
        }
        other => panic!("Expected InvalidRoot, got {:?}", other),
    }
}

#[test]
fn test_repeated_scans_are_identical() {
    let dir = tempdir().unwrap();
    for i in 0..30 {
        let content = format!("payload {}", i % 6);
        write(
            &dir.path().join(format!("d{}/f{}.dat", i % 4, i)),
            content.as_bytes(),
        );
    }

    let finder = DuplicateFinder::with_defaults();
    let (first, _) = finder.find_duplicates(dir.path()).unwrap();
    let (second, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first.len(), 6);
    assert_eq!(first, second);
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, (Vec<u8>, SystemTime)> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let path = e.path().to_path_buf();
            let content = fs::read(&path).unwrap();
            let modified = e.metadata().unwrap().modified().unwrap();
            (path, (content, modified))
        })
        .collect()
}

#[test]
fn test_scan_does_not_modify_tree() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"same");
    write(&dir.path().join("b"), b"same");
    write(&dir.path().join("sub/c"), b"other");

    let before = snapshot(dir.path());
    let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(3));
    finder.find_duplicates(dir.path()).unwrap();
    let after = snapshot(dir.path());

    assert_eq!(before, after);
}

#[test]
fn test_parallel_hashing_preserves_order() {
    let dir = tempdir().unwrap();
    for i in 0..60 {
        let content = format!("block {}", i % 9);
        write(
            &dir.path().join(format!("lvl{}/n{:02}", i % 3, i)),
            content.as_bytes(),
        );
    }

    let sequential = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap()
        .0;
    for threads in [2, 4, 8] {
        let parallel = DuplicateFinder::new(FinderConfig::default().with_io_threads(threads))
            .find_duplicates(dir.path())
            .unwrap()
            .0;
        assert_eq!(sequential, parallel, "io_threads = {}", threads);
    }
}

#[test]
fn test_size_filters_limit_candidates() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("small1"), b"ab");
    write(&dir.path().join("small2"), b"ab");
    write(&dir.path().join("big1"), b"abcdefghij");
    write(&dir.path().join("big2"), b"abcdefghij");

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        min_size: Some(5),
        ..WalkerConfig::default()
    });
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(names(&groups[0]), vec!["big1", "big2"]);
    assert_eq!(summary.total_files, 2);
}

#[cfg(unix)]
mod unreadable {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Lays out two duplicates plus one unreadable file. Returns `None` when
    /// mode bits are not enforced (running as root).
    fn setup() -> Option<tempfile::TempDir> {
        let dir = tempdir().unwrap();
        write(&dir.path().join("a.txt"), b"twin");
        write(&dir.path().join("b.txt"), b"twin");
        let locked = dir.path().join("locked.txt");
        write(&locked, b"twin");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        if File::open(&locked).is_ok() {
            return None;
        }
        Some(dir)
    }

    #[test]
    fn test_unreadable_file_aborts_by_default() {
        let Some(dir) = setup() else { return };

        let result = DuplicateFinder::with_defaults().find_duplicates(dir.path());
        match result {
            Err(FinderError::FileAccess(err)) => {
                assert!(err.path().unwrap().ends_with("locked.txt"));
            }
            other => panic!("Expected FileAccess, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_file_skipped_when_hardened() {
        let Some(dir) = setup() else { return };

        for threads in [1, 4] {
            let config = FinderConfig::default()
                .with_skip_unreadable(true)
                .with_io_threads(threads);
            let (groups, summary) = DuplicateFinder::new(config)
                .find_duplicates(dir.path())
                .unwrap();

            assert_eq!(groups.len(), 1);
            assert_eq!(names(&groups[0]), vec!["a.txt", "b.txt"]);
            assert_eq!(summary.skipped_files, 1);
            assert_eq!(summary.errors.len(), 1);
        }
    }
}
