//! Manifest scanning
//!
//! The manifest is the output of `git ls-files --stage`, one file per line:
//!
//! ```text
//! MODE HASH STAGE<TAB>PATH
//! ```
//!
//! Only `HASH` and `PATH` are used, but all three metadata tokens must be
//! present. Every listed file is stat'ed as it is read; a listed file that
//! is missing on disk ends the scan, since the manifest and the checkout no
//! longer agree.

use crate::error::{MtoolError, Result};
use crate::fs::FileSystem;
use crate::lines::NumberedLines;
use crate::types::ScanRecord;
use std::io::{BufRead, ErrorKind};
use std::path::Path;
use tracing::{debug, trace};

/// Split a manifest line into its metadata group and path
pub fn split_manifest_line(line: usize, text: &str) -> Result<(&str, &str)> {
    text.trim().split_once('\t').ok_or_else(|| {
        MtoolError::malformed(
            line,
            "expected 2 tab-separated fields in 'git ls-files --stage' output",
        )
    })
}

/// Extract the content hash from a `MODE HASH STAGE` group
pub fn parse_metadata(line: usize, metadata: &str) -> Result<&str> {
    let parts: Vec<&str> = metadata.splitn(3, ' ').collect();
    if parts.len() != 3 {
        return Err(MtoolError::malformed(line, "malformed first field"));
    }
    Ok(parts[1])
}

/// Scan a manifest, calling `callback` once per line in input order
///
/// The scan stops at the first malformed line, failed stat or callback
/// error. Callback errors without a line number of their own are tagged with
/// the line being processed. Returns the number of records handed to the
/// callback.
pub fn scan_manifest<R, F, C>(reader: R, fs: &F, mut callback: C) -> Result<usize>
where
    R: BufRead,
    F: FileSystem + ?Sized,
    C: FnMut(ScanRecord) -> Result<()>,
{
    let mut scanned = 0;

    for item in NumberedLines::new(reader) {
        let (line, text) = item?;
        let (metadata, path) = split_manifest_line(line, &text)?;

        let mtime = fs.stat_mtime(Path::new(path)).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                MtoolError::FileNotFound {
                    line,
                    path: path.to_string(),
                }
            } else {
                MtoolError::Stat {
                    line,
                    path: path.to_string(),
                    source,
                }
            }
        })?;

        let hash = parse_metadata(line, metadata)?;
        trace!("line {}: {} {} {}", line, path, hash, mtime.as_nanos());

        callback(ScanRecord {
            line,
            path: path.to_string(),
            hash: hash.to_string(),
            mtime,
        })
        .map_err(|e| e.at_line(line))?;
        scanned += 1;
    }

    debug!("Scanned {} manifest records", scanned);
    Ok(scanned)
}
