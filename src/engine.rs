//! Bounded-concurrency verify/restore engine
//!
//! The engine reads the manifest on the calling thread and hands every
//! record to a pool of exactly `concurrency` worker threads. Each worker looks
//! the record up in the shared [`SnapshotStore`], runs [`decide`], and, when
//! restoring, writes the recorded mtime back. Pass/fail counts go into one
//! [`Counters`] owned by the run.
//!
//! ## Failure handling
//!
//! The first failed mtime update wins. It is kept, a cancel flag is raised,
//! workers that have not started yet skip their record, and the manifest
//! scan stops at its next line. [`RestoreEngine::run`] still waits for every
//! dispatched worker before returning that first error, so no work is left
//! running behind the caller's back. The error carries the line of the
//! record that failed, not of whatever the scanner had reached.

use crate::comparator::{decide, Outcome};
use crate::error::{MtoolError, Result};
use crate::fs::FileSystem;
use crate::manifest::scan_manifest;
use crate::snapshot::SnapshotStore;
use crate::types::{Counters, ScanRecord, Tally};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, info_span};

/// Default number of worker threads
pub const DEFAULT_CONCURRENCY: usize = 1024;

/// Engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Worker threads, and so the bound on in-flight filesystem operations
    pub concurrency: usize,
    /// Compare only; never modify the filesystem
    pub verify_only: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            verify_only: false,
        }
    }
}

impl EngineConfig {
    /// Check the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.concurrency < 1 {
            return Err(MtoolError::invalid_config("concurrency should be 1 or more"));
        }
        Ok(())
    }
}

/// First fatal error of a run plus the flag telling everyone else to stop
#[derive(Debug, Default)]
struct FirstFailure {
    cancelled: AtomicBool,
    error: Mutex<Option<MtoolError>>,
}

impl FirstFailure {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn record(&self, err: MtoolError) {
        let mut slot = self.error.lock();
        if slot.is_none() {
            debug!("Stopping after first failure: {}", err);
            *slot = Some(err);
        }
        self.cancelled.store(true, Ordering::Release);
    }

    fn take(&self) -> Option<MtoolError> {
        self.error.lock().take()
    }
}

/// Verify/restore engine over a fixed-size worker pool
pub struct RestoreEngine<F: FileSystem> {
    fs: F,
    config: EngineConfig,
    pool: ThreadPool,
}

impl<F: FileSystem> std::fmt::Debug for RestoreEngine<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestoreEngine")
            .field("config", &self.config)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl<F: FileSystem> RestoreEngine<F> {
    /// Create an engine and its worker pool
    pub fn new(fs: F, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.concurrency)
            .thread_name(|i| format!("mtool-worker-{}", i))
            .build()
            .map_err(|e| MtoolError::ThreadPool(e.to_string()))?;

        Ok(Self { fs, config, pool })
    }

    /// Process every record of `manifest` against `store`
    ///
    /// Returns the final counters once all workers are done, or the first
    /// fatal error.
    pub fn run<R: BufRead>(&self, store: &SnapshotStore, manifest: R) -> Result<Tally> {
        let start = Instant::now();
        let span = info_span!("engine", verify_only = self.config.verify_only);
        let _entered = span.enter();

        let counters = Counters::new();
        let failure = FirstFailure::default();
        let fs = &self.fs;
        let verify_only = self.config.verify_only;
        let (counters_ref, failure_ref, span_ref) = (&counters, &failure, &span);

        let scanned = self.pool.in_place_scope(|scope| {
            scan_manifest(manifest, fs, |record| {
                if failure_ref.is_cancelled() {
                    return Err(MtoolError::Cancelled);
                }
                scope.spawn(move |_| {
                    let _entered = span_ref.enter();
                    if failure_ref.is_cancelled() {
                        return;
                    }
                    if let Err(err) = process_record(store, fs, &record, verify_only, counters_ref) {
                        failure_ref.record(err);
                    }
                });
                Ok(())
            })
        });

        if let Some(err) = failure.take() {
            return Err(err);
        }
        let scanned = scanned?;

        let tally = counters.tally();
        debug!(
            "Processed {} records in {:?}: {}/{} eligible files match",
            scanned,
            start.elapsed(),
            tally.verified(),
            tally.total_eligible
        );
        Ok(tally)
    }
}

/// Compare one record and restore its mtime if asked to
fn process_record<F: FileSystem + ?Sized>(
    store: &SnapshotStore,
    fs: &F,
    record: &ScanRecord,
    verify_only: bool,
    counters: &Counters,
) -> Result<()> {
    let outcome = decide(store.get(&record.path), record, verify_only);
    counters.record(&outcome);

    if let Outcome::Mismatch { recorded, current, restore } = outcome {
        if restore {
            fs.set_mtime(Path::new(&record.path), recorded)
                .map_err(|source| MtoolError::Mutation {
                    line: record.line,
                    path: record.path.clone(),
                    source,
                })?;
            info!("{}: changed modified time from {} to {}", record.path, current, recorded);
        } else {
            info!(
                "{}: modified time expected {} but found {}",
                record.path,
                recorded.as_nanos(),
                current.as_nanos()
            );
        }
    }
    Ok(())
}
