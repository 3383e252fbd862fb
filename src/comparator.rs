//! Per-file decision between a snapshot entry and a scan record

use crate::types::{Entry, ScanRecord, Timestamp};

/// What to do with one scanned file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not in the snapshot, or its content changed since; mtime is irrelevant
    Skip,
    /// Content unchanged and mtime identical to the recorded one
    Match,
    /// Content unchanged but mtime differs
    Mismatch {
        /// Mtime stored in the snapshot
        recorded: Timestamp,
        /// Mtime currently on disk
        current: Timestamp,
        /// Whether the recorded mtime should be written back
        restore: bool,
    },
}

impl Outcome {
    /// Whether the file counts towards the eligible total
    pub fn is_eligible(&self) -> bool {
        !matches!(self, Outcome::Skip)
    }

    /// Whether the file's mtime differs from the recorded one
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Outcome::Mismatch { .. })
    }
}

/// Compare a scan record against its snapshot entry, if any
///
/// Timestamps must be equal to the nanosecond to match. `verify_only`
/// decides whether a mismatch asks for the recorded mtime to be restored.
pub fn decide(entry: Option<&Entry>, record: &ScanRecord, verify_only: bool) -> Outcome {
    let Some(entry) = entry else {
        return Outcome::Skip;
    };
    if entry.content_hash != record.hash {
        return Outcome::Skip;
    }
    if entry.recorded_mtime == record.mtime {
        Outcome::Match
    } else {
        Outcome::Mismatch {
            recorded: entry.recorded_mtime,
            current: record.mtime,
            restore: !verify_only,
        }
    }
}
