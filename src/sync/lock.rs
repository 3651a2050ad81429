//! Optional advisory lock serializing runs over one document root.
//!
//! The engine never takes this lock itself. Callers that can be triggered
//! concurrently wrap a run in a [`MirrorLock`].

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;
use tracing::debug;

/// Lock file created inside the document root.
pub const LOCK_FILENAME: &str = ".docmirror.lock";

/// Errors from acquiring the lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process holds the lock.
    #[error("another run holds {path}")]
    Busy {
        /// Lock file path.
        path: PathBuf,
    },

    /// The lock file could not be created or locked.
    #[error("failed to lock {path}: {source}")]
    Io {
        /// Lock file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// Exclusive advisory lock held until dropped.
#[derive(Debug)]
pub struct MirrorLock {
    file: File,
    path: PathBuf,
}

impl MirrorLock {
    fn open(docs_dir: &Path) -> Result<(File, PathBuf), LockError> {
        std::fs::create_dir_all(docs_dir).map_err(|source| LockError::Io {
            path: docs_dir.to_path_buf(),
            source,
        })?;
        let path = docs_dir.join(LOCK_FILENAME);
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Io {
                path: path.clone(),
                source,
            })?;
        Ok((file, path))
    }

    /// Acquires the lock without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Busy`] when another holder has it, and
    /// [`LockError::Io`] for any other failure.
    pub fn try_acquire(docs_dir: &Path) -> Result<Self, LockError> {
        let (file, path) = Self::open(docs_dir)?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "mirror lock acquired");
                Ok(Self { file, path })
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                Err(LockError::Busy { path })
            }
            Err(source) => Err(LockError::Io { path, source }),
        }
    }

    /// Returns the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MirrorLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
