//! Snapshot text format, in-memory store and writer
//!
//! A snapshot is one record per line, no header:
//!
//! ```text
//! IDENTITY<TAB>CONTENT_HASH<TAB>MTIME_NANOS
//! ```
//!
//! `MTIME_NANOS` is a base-10 signed 64-bit nanosecond Unix timestamp. The
//! same format is read for verify/restore and written by create, and a record
//! survives a parse/format round trip byte for byte.

use crate::error::{MtoolError, Result};
use crate::fs::FileSystem;
use crate::lines::NumberedLines;
use crate::manifest::scan_manifest;
use crate::types::{Entry, ScanRecord, Timestamp};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Parse one snapshot line
///
/// `line` is the 1-based position used in error messages.
pub fn parse_record(line: usize, text: &str) -> Result<Entry> {
    let parts: Vec<&str> = text.trim().splitn(3, '\t').collect();
    if parts.len() != 3 {
        return Err(MtoolError::malformed(
            line,
            format!(
                "expected 3 tab-separated fields for restore/verify, got {}",
                parts.len()
            ),
        ));
    }

    let nanos = parts[2]
        .parse::<i64>()
        .map_err(|source| MtoolError::InvalidTimestamp {
            line,
            value: parts[2].to_string(),
            source,
        })?;

    Ok(Entry {
        identity: parts[0].to_string(),
        content_hash: parts[1].to_string(),
        recorded_mtime: Timestamp::from_nanos(nanos),
    })
}

/// Format one snapshot record, without the trailing newline
pub fn format_record(identity: &str, content_hash: &str, mtime: Timestamp) -> String {
    format!("{}\t{}\t{}", identity, content_hash, mtime.as_nanos())
}

/// Snapshot loaded into memory, keyed by identity
///
/// Built once and never modified afterwards, so engine workers can share it
/// by reference.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    entries: HashMap<String, Entry>,
}

impl SnapshotStore {
    /// Load a snapshot from its text form
    ///
    /// Stops at the first malformed line, bad timestamp or repeated identity.
    pub fn load<R: BufRead>(reader: R) -> Result<Self> {
        let mut entries = HashMap::new();

        for item in NumberedLines::new(reader) {
            let (line, text) = item?;
            let entry = parse_record(line, &text)?;

            if entries.contains_key(&entry.identity) {
                return Err(MtoolError::DuplicateIdentity {
                    line,
                    identity: entry.identity,
                });
            }
            entries.insert(entry.identity.clone(), entry);
        }

        debug!("Loaded snapshot with {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Entry recorded for `identity`
    pub fn get(&self, identity: &str) -> Option<&Entry> {
        self.entries.get(identity)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sequential writer of snapshot records
#[derive(Debug)]
pub struct SnapshotWriter<W: Write> {
    sink: W,
    written: usize,
}

impl<W: Write> SnapshotWriter<W> {
    /// Wrap an output sink
    pub fn new(sink: W) -> Self {
        Self { sink, written: 0 }
    }

    /// Append one record
    pub fn write_record(&mut self, record: &ScanRecord) -> io::Result<()> {
        writeln!(
            self.sink,
            "{}",
            format_record(&record.path, &record.hash, record.mtime)
        )?;
        self.written += 1;
        Ok(())
    }

    /// Records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush the sink and hand it back
    pub fn finish(mut self) -> io::Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

/// Write a snapshot of every file in `manifest`, in manifest order
///
/// Returns the number of records written.
pub fn create_snapshot<R, F, W>(manifest: R, fs: &F, sink: W) -> Result<usize>
where
    R: BufRead,
    F: FileSystem + ?Sized,
    W: Write,
{
    let mut writer = SnapshotWriter::new(sink);
    scan_manifest(manifest, fs, |record| {
        writer.write_record(&record)?;
        Ok(())
    })?;

    let written = writer.written();
    writer.finish()?;
    debug!("Wrote {} snapshot records", written);
    Ok(written)
}
