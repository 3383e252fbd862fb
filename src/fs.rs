//! Filesystem access used by scanning and restoring
//!
//! Everything mtool does to the filesystem goes through the [`FileSystem`]
//! trait: one metadata lookup per manifest line, and one mtime update per
//! restored file. [`LocalFileSystem`] is the real implementation.

use crate::types::Timestamp;
use filetime::FileTime;
use std::io;
use std::path::Path;

/// Metadata lookup and mutation capability
///
/// Implementations are shared by every engine worker, hence `Send + Sync`.
pub trait FileSystem: Send + Sync {
    /// Current modification time of `path`, following symlinks
    fn stat_mtime(&self, path: &Path) -> io::Result<Timestamp>;

    /// Set the modification time of `path`
    ///
    /// Access time is not preserved; implementations may set it to now.
    fn set_mtime(&self, path: &Path, mtime: Timestamp) -> io::Result<()>;
}

impl<F: FileSystem + ?Sized> FileSystem for &F {
    fn stat_mtime(&self, path: &Path) -> io::Result<Timestamp> {
        (**self).stat_mtime(path)
    }

    fn set_mtime(&self, path: &Path, mtime: Timestamp) -> io::Result<()> {
        (**self).set_mtime(path, mtime)
    }
}

/// The operating system's filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn stat_mtime(&self, path: &Path) -> io::Result<Timestamp> {
        let modified = std::fs::metadata(path)?.modified()?;
        Timestamp::from_system_time(modified)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn set_mtime(&self, path: &Path, mtime: Timestamp) -> io::Result<()> {
        filetime::set_file_times(path, FileTime::now(), mtime.to_file_time())
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryFileSystem;
