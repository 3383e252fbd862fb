//! Main mtool entry point
//!
//! [`Mtool`] ties the pieces together for the three operations a caller
//! wants: create a snapshot from a manifest, verify a checkout against a
//! snapshot, and restore a checkout's mtimes from a snapshot.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use mtool::MtoolBuilder;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mtool = MtoolBuilder::new().concurrency(64).build()?;
//!
//! // `git ls-files --stage > files.txt` beforehand
//! let manifest = BufReader::new(File::open("files.txt")?);
//! let snapshot = BufReader::new(File::open(".mtool")?);
//!
//! let report = mtool.verify(snapshot, manifest)?;
//! println!("{}/{} files match", report.verified, report.total_eligible);
//! # Ok(())
//! # }
//! ```

use crate::engine::{EngineConfig, RestoreEngine, DEFAULT_CONCURRENCY};
use crate::error::{MtoolError, Result};
use crate::fs::{FileSystem, LocalFileSystem};
use crate::snapshot::{create_snapshot, SnapshotStore};
use crate::types::{CreateReport, RunMode, RunReport};
use std::io::{BufRead, Write};
use std::time::Instant;
use tracing::debug;

/// Snapshot creation, verification and restoration
#[derive(Debug)]
pub struct Mtool<F: FileSystem = LocalFileSystem> {
    fs: F,
    concurrency: usize,
}

impl Mtool<LocalFileSystem> {
    /// Create an instance on the local filesystem with default settings
    pub fn new() -> Self {
        Self {
            fs: LocalFileSystem,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Default for Mtool<LocalFileSystem> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> Mtool<F> {
    /// Worker threads used for verify and restore
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Write a snapshot line for every file in `manifest` to `sink`
    pub fn create<R: BufRead, W: Write>(&self, manifest: R, sink: W) -> Result<CreateReport> {
        let start = Instant::now();
        let records_written = create_snapshot(manifest, &self.fs, sink)?;
        let duration = start.elapsed();

        debug!("Created snapshot of {} files in {:?}", records_written, duration);
        Ok(CreateReport {
            records_written,
            duration_ms: duration.as_millis() as u64,
        })
    }

    /// Load a snapshot into memory
    pub fn load_snapshot<R: BufRead>(&self, snapshot: R) -> Result<SnapshotStore> {
        SnapshotStore::load(snapshot)
    }

    /// Compare current mtimes with the snapshot without changing anything
    pub fn verify<S: BufRead, R: BufRead>(&self, snapshot: S, manifest: R) -> Result<RunReport> {
        self.run(RunMode::Verify, snapshot, manifest)
    }

    /// Set mismatching mtimes back to the values recorded in the snapshot
    pub fn restore<S: BufRead, R: BufRead>(&self, snapshot: S, manifest: R) -> Result<RunReport> {
        self.run(RunMode::Restore, snapshot, manifest)
    }

    fn run<S: BufRead, R: BufRead>(&self, mode: RunMode, snapshot: S, manifest: R) -> Result<RunReport> {
        let start = Instant::now();
        let store = self.load_snapshot(snapshot)?;

        let config = EngineConfig {
            concurrency: self.concurrency,
            verify_only: mode == RunMode::Verify,
        };
        let tally = RestoreEngine::new(&self.fs, config)?.run(&store, manifest)?;
        let duration = start.elapsed();

        debug!(
            "{:?}: {}/{} files verified successfully in {:?}",
            mode,
            tally.verified(),
            tally.total_eligible,
            duration
        );
        Ok(RunReport::new(mode, tally, duration.as_millis() as u64))
    }
}

/// Builder for [`Mtool`]
#[derive(Debug)]
pub struct MtoolBuilder<F: FileSystem = LocalFileSystem> {
    fs: F,
    concurrency: usize,
}

impl MtoolBuilder<LocalFileSystem> {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self {
            fs: LocalFileSystem,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Default for MtoolBuilder<LocalFileSystem> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> MtoolBuilder<F> {
    /// Set how many files are verified or restored at once (minimum 1)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mtool::MtoolBuilder;
    ///
    /// let mtool = MtoolBuilder::new().concurrency(8).build().unwrap();
    /// assert_eq!(mtool.concurrency(), 8);
    /// ```
    pub fn concurrency(mut self, count: usize) -> Self {
        self.concurrency = count;
        self
    }

    /// Use a different filesystem implementation
    pub fn file_system<G: FileSystem>(self, fs: G) -> MtoolBuilder<G> {
        MtoolBuilder {
            fs,
            concurrency: self.concurrency,
        }
    }

    /// Validate the settings and build
    pub fn build(self) -> Result<Mtool<F>> {
        if self.concurrency < 1 {
            return Err(MtoolError::invalid_config("concurrency should be 1 or more"));
        }
        Ok(Mtool {
            fs: self.fs,
            concurrency: self.concurrency,
        })
    }
}
