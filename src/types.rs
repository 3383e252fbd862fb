//! Core data types used throughout mtool
//!
//! ## Overview
//!
//! - **Timestamps**: [`Timestamp`] - nanosecond Unix time, the unit of the snapshot format
//! - **Records**: [`Entry`], [`ScanRecord`] - one snapshot line, one manifest observation
//! - **Aggregation**: [`Counters`], [`Tally`] - shared pass/fail counts of an engine run
//! - **Reports**: [`RunReport`], [`CreateReport`] - results handed back to callers

use crate::comparator::Outcome;
use crate::error::{MtoolError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use filetime::FileTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Modification time as signed nanoseconds since the Unix epoch
///
/// Comparisons are exact to the nanosecond; two timestamps that differ in
/// the last digit are different timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a timestamp from nanoseconds since the Unix epoch
    pub const fn from_nanos(nanos: i64) -> Self {
        Timestamp(nanos)
    }

    /// Nanoseconds since the Unix epoch
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Convert a filesystem time, failing if it does not fit in i64 nanoseconds
    pub fn from_file_time(time: FileTime) -> Result<Self> {
        let nanos = i128::from(time.unix_seconds()) * i128::from(NANOS_PER_SEC)
            + i128::from(time.nanoseconds());
        i64::try_from(nanos)
            .map(Timestamp)
            .map_err(|_| MtoolError::TimestampOutOfRange(format!("{}s", time.unix_seconds())))
    }

    /// Convert a `SystemTime`, failing if it does not fit in i64 nanoseconds
    pub fn from_system_time(time: SystemTime) -> Result<Self> {
        Self::from_file_time(FileTime::from_system_time(time))
    }

    /// Filesystem representation of this timestamp
    pub fn to_file_time(self) -> FileTime {
        let secs = self.0.div_euclid(NANOS_PER_SEC);
        let nanos = self.0.rem_euclid(NANOS_PER_SEC) as u32;
        FileTime::from_unix_time(secs, nanos)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let instant = DateTime::<Utc>::from_timestamp_nanos(self.0);
        write!(f, "{}", instant.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }
}

/// One record of a loaded snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// File path, unique within a snapshot
    pub identity: String,
    /// Content hash recorded when the snapshot was created
    pub content_hash: String,
    /// Modification time recorded when the snapshot was created
    pub recorded_mtime: Timestamp,
}

/// One observation from the current filesystem pass
///
/// Built from a manifest line plus a live stat of the file it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    /// 1-based line of the manifest this record came from
    pub line: usize,
    /// File path (the identity)
    pub path: String,
    /// Content hash as reported by the manifest
    pub hash: String,
    /// Current modification time on disk
    pub mtime: Timestamp,
}

/// Shared pass/fail counters of one engine run
///
/// Workers update it concurrently; read it with [`Counters::tally`] once
/// all of them have finished.
#[derive(Debug, Default)]
pub struct Counters {
    total_eligible: AtomicU64,
    non_matching: AtomicU64,
}

impl Counters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one comparator outcome
    pub fn record(&self, outcome: &Outcome) {
        if !outcome.is_eligible() {
            return;
        }
        self.total_eligible.fetch_add(1, Ordering::Relaxed);
        if outcome.is_mismatch() {
            self.non_matching.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Current values as a plain snapshot
    pub fn tally(&self) -> Tally {
        Tally {
            total_eligible: self.total_eligible.load(Ordering::Relaxed),
            non_matching: self.non_matching.load(Ordering::Relaxed),
        }
    }
}

/// Final counter values of an engine run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Files present in the snapshot with an unchanged content hash
    pub total_eligible: u64,
    /// Eligible files whose mtime differed from the recorded one
    pub non_matching: u64,
}

impl Tally {
    /// Eligible files whose mtime already matched
    pub fn verified(&self) -> u64 {
        self.total_eligible - self.non_matching
    }
}

/// Which operation a run performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Compare only, never touch the filesystem
    Verify,
    /// Compare and set mismatching mtimes back to their recorded value
    Restore,
}

/// Result of a verify or restore run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Operation performed
    pub mode: RunMode,
    /// Files eligible for comparison
    pub total_eligible: u64,
    /// Eligible files with a differing mtime
    pub non_matching: u64,
    /// Eligible files whose mtime already matched
    pub verified: u64,
    /// Wall time of the run
    pub duration_ms: u64,
}

impl RunReport {
    pub(crate) fn new(mode: RunMode, tally: Tally, duration_ms: u64) -> Self {
        Self {
            mode,
            total_eligible: tally.total_eligible,
            non_matching: tally.non_matching,
            verified: tally.verified(),
            duration_ms,
        }
    }

    /// Process exit status for this result
    ///
    /// Verify reports the number of non-matching files, capped at 255 so a
    /// large count never wraps around to success. Restore always reports 0.
    pub fn exit_code(&self) -> i32 {
        match self.mode {
            RunMode::Verify => self.non_matching.min(255) as i32,
            RunMode::Restore => 0,
        }
    }
}

/// Result of creating a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReport {
    /// Records written to the snapshot
    pub records_written: usize,
    /// Wall time of the run
    pub duration_ms: u64,
}
