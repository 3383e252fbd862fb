//! Property-based testing for mtool
//!
//! Uses proptest to check invariants of the engine over randomly generated
//! checkouts.

use ::mtool::*;
use proptest::prelude::*;
use std::io::Cursor;
use tempfile::TempDir;

/// One generated file: whether its content changed since the snapshot,
/// its recorded mtime, and its current mtime (both in seconds)
#[derive(Debug, Clone)]
pub struct FileCase {
    pub changed: bool,
    pub recorded: i64,
    pub current: i64,
}

fn file_case_strategy() -> impl Strategy<Value = FileCase> {
    (any::<bool>(), 1_000i64..1_010, 1_000i64..1_010).prop_map(|(changed, recorded, current)| {
        FileCase { changed, recorded, current }
    })
}

/// Lay the cases out on disk and return (snapshot, manifest)
fn build_checkout(root: &TempDir, cases: &[FileCase]) -> (String, String) {
    let mut snapshot = String::new();
    let mut manifest = String::new();

    for (i, case) in cases.iter().enumerate() {
        let path = root.path().join(format!("file{i}"));
        std::fs::write(&path, i.to_string()).unwrap();
        let current = Timestamp::from_nanos(case.current * 1_000_000_000);
        filetime::set_file_mtime(&path, current.to_file_time()).unwrap();

        let hash = if case.changed { "new" } else { "old" };
        snapshot.push_str(&format!("{}\told\t{}\n", path.display(), case.recorded * 1_000_000_000));
        manifest.push_str(&format!("100644 {} 0\t{}\n", hash, path.display()));
    }
    (snapshot, manifest)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_verify_counts_match_model(
        cases in prop::collection::vec(file_case_strategy(), 0..30),
        concurrency in 1usize..16,
    ) {
        let root = TempDir::new().unwrap();
        let (snapshot, manifest) = build_checkout(&root, &cases);

        let mtool = MtoolBuilder::new().concurrency(concurrency).build().unwrap();
        let report = mtool.verify(Cursor::new(snapshot), Cursor::new(manifest)).unwrap();

        let eligible = cases.iter().filter(|c| !c.changed).count() as u64;
        let stale = cases.iter().filter(|c| !c.changed && c.recorded != c.current).count() as u64;
        prop_assert_eq!(report.total_eligible, eligible);
        prop_assert_eq!(report.non_matching, stale);
    }

    #[test]
    fn prop_restore_then_verify_is_clean(
        cases in prop::collection::vec(file_case_strategy(), 1..30),
        concurrency in 1usize..16,
    ) {
        let root = TempDir::new().unwrap();
        let (snapshot, manifest) = build_checkout(&root, &cases);

        let mtool = MtoolBuilder::new().concurrency(concurrency).build().unwrap();
        mtool.restore(Cursor::new(&snapshot), Cursor::new(&manifest)).unwrap();
        let report = mtool.verify(Cursor::new(&snapshot), Cursor::new(&manifest)).unwrap();

        prop_assert_eq!(report.non_matching, 0);
        prop_assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn prop_create_then_verify_matches(
        count in 0usize..25,
    ) {
        let root = TempDir::new().unwrap();
        let mut manifest = String::new();
        for i in 0..count {
            let path = root.path().join(format!("f{i}"));
            std::fs::write(&path, "x").unwrap();
            manifest.push_str(&format!("100644 h{} 0\t{}\n", i, path.display()));
        }

        let mtool = MtoolBuilder::new().concurrency(4).build().unwrap();
        let mut snapshot = Vec::new();
        let created = mtool.create(Cursor::new(&manifest), &mut snapshot).unwrap();
        prop_assert_eq!(created.records_written, count);

        let report = mtool.verify(Cursor::new(snapshot), Cursor::new(&manifest)).unwrap();
        prop_assert_eq!(report.total_eligible, count as u64);
        prop_assert_eq!(report.non_matching, 0);
    }
}
