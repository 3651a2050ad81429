//! Manifest persistence seam.
//!
//! The sync engine only touches durable state through [`ManifestStore`]:
//! one `load` at the start of a run and one `save` at the end.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::Manifest;
use crate::atomic::write_atomic;

/// Manifest filename inside the document root.
pub const MANIFEST_FILENAME: &str = "docs_manifest.json";

/// Errors from persisting a manifest. Loading never fails.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Writing or renaming the manifest file failed.
    #[error("failed to write manifest {path}: {source}")]
    Io {
        /// Target path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be encoded.
    #[error("failed to encode manifest: {source}")]
    Serialize {
        /// Underlying error.
        #[from]
        source: serde_json::Error,
    },
}

impl ManifestError {
    /// Creates an I/O error for `path`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Load/save contract for the mirror's only durable state.
#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Returns the stored manifest, or an empty one when it is missing or
    /// unreadable.
    async fn load(&self) -> Manifest;

    /// Stamps the manifest's timestamp and provenance, persists it as a
    /// whole, and returns the stamped copy.
    async fn save(&self, manifest: Manifest) -> Result<Manifest, ManifestError>;
}

/// JSON file store at `<docs_dir>/docs_manifest.json`.
///
/// Saves go through a temporary sibling file and a rename, so a concurrent
/// reader sees either the previous manifest or the new one.
#[derive(Debug, Clone)]
pub struct JsonManifestStore {
    path: PathBuf,
}

impl JsonManifestStore {
    /// Creates a store for the manifest inside `docs_dir`.
    #[must_use]
    pub fn new(docs_dir: impl AsRef<Path>) -> Self {
        Self {
            path: docs_dir.as_ref().join(MANIFEST_FILENAME),
        }
    }

    /// Returns the manifest file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ManifestStore for JsonManifestStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Manifest {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!("no manifest yet, starting empty");
                return Manifest::default();
            }
            Err(error) => {
                warn!(error = %error, "manifest unreadable, starting empty");
                return Manifest::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(manifest) => manifest,
            Err(error) => {
                warn!(error = %error, "manifest corrupt, starting empty");
                Manifest::default()
            }
        }
    }

    #[instrument(skip(self, manifest), fields(path = %self.path.display()))]
    async fn save(&self, manifest: Manifest) -> Result<Manifest, ManifestError> {
        let manifest = manifest.stamped(Utc::now());
        let json = serde_json::to_vec_pretty(&manifest)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ManifestError::io(parent, e))?;
        }
        write_atomic(&self.path, &json)
            .await
            .map_err(|e| ManifestError::io(&self.path, e))?;

        info!(files = manifest.files.len(), "manifest saved");
        Ok(manifest)
    }
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryManifestStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    manifest: Manifest,
    saves: usize,
}

impl MemoryManifestStore {
    /// Creates a store pre-populated with `manifest`.
    #[must_use]
    pub fn with_manifest(manifest: Manifest) -> Self {
        Self {
            state: Mutex::new(MemoryState { manifest, saves: 0 }),
        }
    }

    /// Returns the currently stored manifest.
    pub async fn snapshot(&self) -> Manifest {
        self.state.lock().await.manifest.clone()
    }

    /// Returns how many times `save` has been called.
    pub async fn save_count(&self) -> usize {
        self.state.lock().await.saves
    }
}

#[async_trait]
impl ManifestStore for MemoryManifestStore {
    async fn load(&self) -> Manifest {
        self.snapshot().await
    }

    async fn save(&self, manifest: Manifest) -> Result<Manifest, ManifestError> {
        let manifest = manifest.stamped(Utc::now());
        let mut state = self.state.lock().await;
        state.manifest = manifest.clone();
        state.saves += 1;
        Ok(manifest)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manifest::{MANIFEST_SKILL, MANIFEST_SOURCE, ManifestEntry};
    use tempfile::tempdir;

    fn entry(hash: &str) -> ManifestEntry {
        ManifestEntry {
            original_url: "https://docs.example.com/en/docs/claude-code/hooks".to_string(),
            original_content_url: "https://docs.example.com/en/docs/claude-code/hooks.md"
                .to_string(),
            hash: hash.to_string(),
            last_updated: Utc::now(),
            source: None,
        }
    }

    #[tokio::test]
    async fn test_load_missing_returns_empty() {
        let dir = tempdir().unwrap();
        let store = JsonManifestStore::new(dir.path());
        assert_eq!(store.load().await, Manifest::default());
    }

    #[tokio::test]
    async fn test_load_corrupt_returns_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILENAME), "{ not json").unwrap();
        let store = JsonManifestStore::new(dir.path());
        assert_eq!(store.load().await, Manifest::default());
    }

    #[tokio::test]
    async fn test_load_wrong_shape_returns_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILENAME), r#"{"files": []}"#).unwrap();
        let store = JsonManifestStore::new(dir.path());
        assert_eq!(store.load().await, Manifest::default());
    }

    #[tokio::test]
    async fn test_load_accepts_manifest_with_naive_timestamps() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILENAME),
            r#"{
  "files": {
    "hooks.md": {
      "original_url": "https://docs.anthropic.com/en/docs/claude-code/hooks",
      "original_md_url": "https://docs.anthropic.com/en/docs/claude-code/hooks.md",
      "hash": "abc",
      "last_updated": "2025-01-02T03:04:05.123456"
    }
  },
  "last_updated": "2025-01-02T03:04:06.000001",
  "source": "https://docs.anthropic.com/en/docs/claude-code/"
}"#,
        )
        .unwrap();
        let store = JsonManifestStore::new(dir.path());

        let manifest = store.load().await;

        assert_eq!(manifest.files.len(), 1);
        assert_eq!(manifest.entry("hooks.md").unwrap().hash, "abc");
        assert!(manifest.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_save_then_load_roundtrips_and_stamps() {
        let dir = tempdir().unwrap();
        let store = JsonManifestStore::new(dir.path());

        let mut manifest = Manifest::default();
        manifest.files.insert("hooks.md".to_string(), entry("abc"));
        let saved = store.save(manifest).await.unwrap();

        assert!(saved.last_updated.is_some());
        assert_eq!(saved.source.as_deref(), Some(MANIFEST_SOURCE));
        assert_eq!(saved.skill.as_deref(), Some(MANIFEST_SKILL));
        assert_eq!(store.load().await, saved);
    }

    #[tokio::test]
    async fn test_save_creates_missing_docs_dir() {
        let dir = tempdir().unwrap();
        let store = JsonManifestStore::new(dir.path().join("nested").join("docs"));
        store.save(Manifest::default()).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_save_writes_human_readable_json() {
        let dir = tempdir().unwrap();
        let store = JsonManifestStore::new(dir.path());
        store.save(Manifest::default()).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["last_updated"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_memory_store_counts_saves() {
        let store = MemoryManifestStore::default();
        assert_eq!(store.save_count().await, 0);

        let mut manifest = Manifest::default();
        manifest.files.insert("a.md".to_string(), entry("1"));
        store.save(manifest).await.unwrap();

        assert_eq!(store.save_count().await, 1);
        assert!(store.load().await.entry("a.md").is_some());
    }
}
