//! # mtool - reproducible file modification times
//!
//! Version control systems track file content but not timestamps, so every
//! fresh checkout gets "now" as the mtime of every file. That defeats build
//! systems and caches keyed on mtimes. mtool records the mtimes of a
//! checkout once and puts them back later, on any machine, for every file
//! whose content is still the same.
//!
//! ## Overview
//!
//! mtool works from two line-oriented text files:
//!
//! - a **manifest** in `git ls-files --stage` format, naming each file and
//!   its content hash;
//! - a **snapshot**, one `PATH<TAB>HASH<TAB>MTIME_NANOS` line per file.
//!
//! Three operations are built on them:
//!
//! - **create**: stat every manifest file and write a snapshot
//! - **verify**: count files whose content is unchanged but whose mtime is not
//! - **restore**: like verify, but also set those files' mtimes back
//!
//! Files missing from the snapshot, or whose hash changed since, are left
//! alone: their old mtime no longer describes their content.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mtool::Mtool;
//! use std::fs::File;
//! use std::io::{BufReader, BufWriter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mtool = Mtool::new();
//!
//! // Record
//! let manifest = BufReader::new(File::open("files.txt")?);
//! mtool.create(manifest, BufWriter::new(File::create(".mtool")?))?;
//!
//! // ... fresh checkout elsewhere ...
//!
//! // Restore
//! let manifest = BufReader::new(File::open("files.txt")?);
//! let snapshot = BufReader::new(File::open(".mtool")?);
//! let report = mtool.restore(snapshot, manifest)?;
//! println!("Restored {} of {} files", report.non_matching, report.total_eligible);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Verify and restore run on a fixed pool of worker threads (1024 by
//! default) so that huge checkouts are not limited by one syscall at a time,
//! while the number of in-flight filesystem operations stays bounded. Create
//! is a single sequential pass because the snapshot must follow manifest
//! order.
//!
//! ## Error Handling
//!
//! Every operation returns `Result<T, MtoolError>`. Errors are fatal to the
//! run and carry the line number of the record that caused them.
//!
//! ## Module Organization
//!
//! - [`mtool`]: the `Mtool` facade and its builder
//! - [`engine`]: the concurrent verify/restore engine
//! - [`comparator`]: per-file decision logic
//! - [`snapshot`]: snapshot format, in-memory store and writer
//! - [`manifest`]: manifest parsing and scanning
//! - [`fs`]: filesystem capability trait
//! - [`types`]: common types
//! - [`error`]: error types

pub mod comparator;
pub mod engine;
pub mod error;
pub mod fs;
mod lines;
pub mod manifest;
pub mod mtool;
pub mod snapshot;
pub mod types;

pub use comparator::{decide, Outcome};
pub use engine::{EngineConfig, RestoreEngine, DEFAULT_CONCURRENCY};
pub use error::{MtoolError, Result};
pub use fs::{FileSystem, LocalFileSystem};
pub use manifest::scan_manifest;
pub use mtool::{Mtool, MtoolBuilder};
pub use snapshot::{create_snapshot, SnapshotStore, SnapshotWriter};
pub use types::*;
