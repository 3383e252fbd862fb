//! Error types for mtool
//!
//! Every failure in mtool is fatal to the pass that hit it. Errors carry the
//! 1-based line number of the input record that caused them wherever one is
//! known, so the first cause can always be traced back to the offending
//! manifest or snapshot line.

use thiserror::Error;

/// Type alias for Results in mtool
pub type Result<T> = std::result::Result<T, MtoolError>;

/// Main error type for all mtool operations
#[derive(Debug, Error)]
pub enum MtoolError {
    /// I/O errors while reading input or writing output
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record had the wrong number of fields
    #[error("line {line}: {reason}")]
    MalformedRecord {
        /// Line of the offending record
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The same identity appeared twice in one snapshot
    #[error("line {line}: filename collision in mtool snapshot for {identity:?}")]
    DuplicateIdentity {
        /// Line of the second occurrence
        line: usize,
        /// The repeated identity
        identity: String,
    },

    /// The mtime field of a snapshot record is not a base-10 i64
    #[error("line {line}: invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        /// Line of the offending record
        line: usize,
        /// Raw field value
        value: String,
        /// Parse failure
        source: std::num::ParseIntError,
    },

    /// A manifest entry has no file on disk
    #[error("line {line}: file not found: {path}")]
    FileNotFound {
        /// Manifest line
        line: usize,
        /// Path that could not be found
        path: String,
    },

    /// Reading file metadata failed for a reason other than absence
    #[error("line {line}: cannot stat {path}: {source}")]
    Stat {
        /// Manifest line
        line: usize,
        /// Path being examined
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Setting a file's modification time failed
    #[error("line {line}: cannot set modified time of {path}: {source}")]
    Mutation {
        /// Manifest line
        line: usize,
        /// Path being restored
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// A per-record callback failed while scanning
    #[error("line {line}: {source}")]
    Callback {
        /// Manifest line handed to the callback
        line: usize,
        /// The callback's error
        source: Box<MtoolError>,
    },

    /// A filesystem timestamp does not fit in signed 64-bit nanoseconds
    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Thread pool error
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Work was abandoned because another worker already failed
    #[error("cancelled after an earlier failure")]
    Cancelled,
}

impl MtoolError {
    /// Create a malformed record error
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        MtoolError::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        MtoolError::InvalidConfiguration(msg.into())
    }

    /// Line number of the record that caused this error, if known
    pub fn line(&self) -> Option<usize> {
        match self {
            MtoolError::MalformedRecord { line, .. }
            | MtoolError::DuplicateIdentity { line, .. }
            | MtoolError::InvalidTimestamp { line, .. }
            | MtoolError::FileNotFound { line, .. }
            | MtoolError::Stat { line, .. }
            | MtoolError::Mutation { line, .. }
            | MtoolError::Callback { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Attach a line number unless the error already has one
    pub fn at_line(self, line: usize) -> Self {
        if self.line().is_some() {
            self
        } else {
            MtoolError::Callback {
                line,
                source: Box::new(self),
            }
        }
    }

    /// Process exit status the CLI reports for this error
    ///
    /// 10 for bad usage or malformed input, 15 for I/O and stat failures,
    /// 20 for failures while acting on a record.
    pub fn exit_code(&self) -> i32 {
        match self {
            MtoolError::MalformedRecord { .. }
            | MtoolError::DuplicateIdentity { .. }
            | MtoolError::InvalidConfiguration(_) => 10,
            MtoolError::Io(_)
            | MtoolError::InvalidTimestamp { .. }
            | MtoolError::FileNotFound { .. }
            | MtoolError::Stat { .. }
            | MtoolError::TimestampOutOfRange(_)
            | MtoolError::ThreadPool(_) => 15,
            MtoolError::Mutation { .. } | MtoolError::Callback { .. } | MtoolError::Cancelled => 20,
        }
    }
}
