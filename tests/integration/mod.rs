//! Integration tests for mtool on real files
//!
//! Each test builds a small checkout in a temporary directory, writes a
//! manifest naming its files by absolute path, and drives create, verify
//! and restore against the local filesystem.

use ::mtool::*;
use filetime::FileTime;
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;

/// A temporary checkout plus its manifest
pub struct CheckoutHarness {
    pub temp_dir: TempDir,
    files: Vec<(PathBuf, String)>,
}

impl CheckoutHarness {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
            files: Vec::new(),
        }
    }

    /// Create a file and list it in the manifest with `hash`
    pub fn add_file(&mut self, name: &str, hash: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, format!("content of {name}")).unwrap();
        self.files.push((path.clone(), hash.to_string()));
        path
    }

    /// Change the hash the manifest reports for `name`, as after an edit
    pub fn set_hash(&mut self, name: &str, hash: &str) {
        let path = self.temp_dir.path().join(name);
        for (p, h) in &mut self.files {
            if *p == path {
                *h = hash.to_string();
            }
        }
    }

    pub fn manifest(&self) -> String {
        self.files
            .iter()
            .map(|(path, hash)| format!("100644 {} 0\t{}\n", hash, path.display()))
            .collect()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn set_mtime(&self, name: &str, nanos: i64) {
        let time = Timestamp::from_nanos(nanos).to_file_time();
        filetime::set_file_mtime(self.path(name), time).unwrap();
    }

    pub fn mtime(&self, name: &str) -> i64 {
        let metadata = std::fs::metadata(self.path(name)).unwrap();
        Timestamp::from_file_time(FileTime::from_last_modification_time(&metadata))
            .unwrap()
            .as_nanos()
    }
}

impl Default for CheckoutHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn test_verify_and_restore_spec_example() {
    let mut harness = CheckoutHarness::new();
    let path = harness.add_file("a.txt", "hash1");
    harness.set_mtime("a.txt", 2_000_000_000);

    let snapshot = format!("{}\thash1\t1000000000\n", path.display());
    let mtool = Mtool::new();

    let report = mtool
        .verify(Cursor::new(&snapshot), Cursor::new(harness.manifest()))
        .unwrap();
    assert_eq!(report.non_matching, 1);
    assert_eq!(report.exit_code(), 1);
    assert_eq!(harness.mtime("a.txt"), 2_000_000_000);

    let report = mtool
        .restore(Cursor::new(&snapshot), Cursor::new(harness.manifest()))
        .unwrap();
    assert_eq!(report.exit_code(), 0);
    assert_eq!(harness.mtime("a.txt"), 1_000_000_000);
}

#[test]
fn test_changed_hash_leaves_file_alone() {
    let mut harness = CheckoutHarness::new();
    let path = harness.add_file("a.txt", "hash2");
    harness.set_mtime("a.txt", 2_000_000_000);

    let snapshot = format!("{}\thash1\t1000000000\n", path.display());
    let report = Mtool::new()
        .restore(Cursor::new(snapshot), Cursor::new(harness.manifest()))
        .unwrap();

    assert_eq!(report.total_eligible, 0);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(harness.mtime("a.txt"), 2_000_000_000);
}

#[test]
fn test_create_touch_restore_cycle() {
    let mut harness = CheckoutHarness::new();
    for i in 0..50 {
        harness.add_file(&format!("dir{}/file{}.txt", i % 5, i), &format!("h{i}"));
        harness.set_mtime(&format!("dir{}/file{}.txt", i % 5, i), 1_600_000_000_123_456_789 + i);
    }
    let mtool = MtoolBuilder::new().concurrency(8).build().unwrap();

    let mut snapshot = Vec::new();
    let created = mtool.create(Cursor::new(harness.manifest()), &mut snapshot).unwrap();
    assert_eq!(created.records_written, 50);

    // A fresh checkout touches everything; one file also gets new content
    for i in 0..50 {
        harness.set_mtime(&format!("dir{}/file{}.txt", i % 5, i), 1_700_000_000_000_000_000);
    }
    harness.set_hash("dir0/file0.txt", "edited");

    let report = mtool
        .verify(Cursor::new(&snapshot), Cursor::new(harness.manifest()))
        .unwrap();
    assert_eq!(report.total_eligible, 49);
    assert_eq!(report.non_matching, 49);

    mtool
        .restore(Cursor::new(&snapshot), Cursor::new(harness.manifest()))
        .unwrap();
    assert_eq!(harness.mtime("dir1/file11.txt"), 1_600_000_000_123_456_789 + 11);
    assert_eq!(harness.mtime("dir0/file0.txt"), 1_700_000_000_000_000_000);

    let report = mtool
        .verify(Cursor::new(&snapshot), Cursor::new(harness.manifest()))
        .unwrap();
    assert_eq!(report.non_matching, 0);
    assert_eq!(report.verified, 49);
}

#[test]
fn test_missing_file_is_fatal() {
    let mut harness = CheckoutHarness::new();
    harness.add_file("a.txt", "h");
    harness.add_file("b.txt", "h");
    std::fs::remove_file(harness.path("b.txt")).unwrap();

    let mut out = Vec::new();
    let err = Mtool::new()
        .create(Cursor::new(harness.manifest()), &mut out)
        .unwrap_err();

    assert!(matches!(err, MtoolError::FileNotFound { line: 2, .. }));
    assert_eq!(err.exit_code(), 15);
}

#[test]
fn test_snapshot_file_is_bit_exact() {
    let mut harness = CheckoutHarness::new();
    let a = harness.add_file("a.txt", "0123abcd");
    let b = harness.add_file("b.txt", "ffff0000");
    harness.set_mtime("a.txt", 1_000_000_000);
    harness.set_mtime("b.txt", 1_234_567_890_987_654_321);

    let mut out = Vec::new();
    Mtool::new().create(Cursor::new(harness.manifest()), &mut out).unwrap();

    let expected = format!(
        "{}\t0123abcd\t1000000000\n{}\tffff0000\t1234567890987654321\n",
        a.display(),
        b.display()
    );
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}
