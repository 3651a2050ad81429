use std::path::PathBuf;

use thiserror::Error;

use crate::discovery::DiscoveryError;
use crate::manifest::{FetchMetadata, ManifestError};

/// Run-level failures. Per-document errors never surface here.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No candidate sitemap was usable; nothing was touched.
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Every page and the changelog failed. The manifest was still saved.
    #[error("no documents fetched successfully ({} failed)", summary.pages_failed)]
    AllFailed {
        /// Metadata of the failed run, as saved.
        summary: Box<FetchMetadata>,
    },

    /// Saving the manifest failed.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// The document root could not be prepared.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Creates an I/O error for `path`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
