//! Main test module for mtool
//!
//! This module includes all test suites:
//! - Integration tests on real files in temporary directories
//! - Property-based tests for invariants

pub mod integration;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use ::mtool::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_empty_manifest_and_snapshot() {
        let mtool = Mtool::new();

        let mut out = Vec::new();
        let created = mtool.create(Cursor::new(""), &mut out).unwrap();
        assert_eq!(created.records_written, 0);
        assert!(out.is_empty());

        let report = mtool.verify(Cursor::new(""), Cursor::new("")).unwrap();
        assert_eq!(report.total_eligible, 0);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_special_filenames() {
        let temp_dir = TempDir::new().unwrap();
        let names = [
            "file with spaces.txt",
            "file-with-dashes.txt",
            "file.with.dots.txt",
            "file@with#special$chars.txt",
            "file(with)parens.txt",
        ];

        let mut manifest = String::new();
        for name in &names {
            let path = temp_dir.path().join(name);
            std::fs::write(&path, name).unwrap();
            manifest.push_str(&format!("100644 {} 0\t{}\n", name.len(), path.display()));
        }

        let mtool = MtoolBuilder::new().concurrency(4).build().unwrap();
        let mut snapshot = Vec::new();
        mtool.create(Cursor::new(&manifest), &mut snapshot).unwrap();

        let report = mtool.verify(Cursor::new(snapshot), Cursor::new(&manifest)).unwrap();
        assert_eq!(report.total_eligible, names.len() as u64);
        assert_eq!(report.non_matching, 0);
    }

    #[test]
    fn test_windows_line_endings_in_snapshot() {
        let snapshot = "a.txt\thash1\t1000000000\r\n";
        let store = SnapshotStore::load(Cursor::new(snapshot)).unwrap();
        assert_eq!(
            store.get("a.txt").unwrap().recorded_mtime,
            Timestamp::from_nanos(1_000_000_000)
        );
    }

    #[test]
    fn test_blank_line_is_malformed() {
        let err = SnapshotStore::load(Cursor::new("a.txt\th\t1\n\n")).unwrap_err();
        assert!(matches!(err, MtoolError::MalformedRecord { line: 2, .. }));
    }
}
