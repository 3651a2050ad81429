//! Reconciliation of the local mirror against the remote corpus.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{error, info, instrument, warn};

use super::SyncError;
use super::staleness::is_stale;
use crate::atomic::write_atomic;
use crate::config::MirrorConfig;
use crate::discovery::{DiscoveredSource, DiscoverySource, SourceDiscoverer};
use crate::fetch::{
    CHANGELOG_FILENAME, FetchedDocument, HttpClient, RetryingFetcher, url_to_safe_filename,
};
use crate::manifest::{FetchMetadata, JsonManifestStore, Manifest, ManifestEntry, ManifestStore};
use crate::validate::ContentValidator;

/// Origin tag recorded on the changelog entry.
pub const CHANGELOG_SOURCE_TAG: &str = "claude-code-repository";

/// Identifier recorded in `failed_pages` when the changelog fails.
pub const CHANGELOG_FAILURE_ID: &str = "changelog";

/// Result of one `reconcile` call.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The manifest was fresh; nothing was fetched or written.
    Skipped {
        /// Timestamp that made the mirror fresh.
        last_updated: Option<DateTime<Utc>>,
    },
    /// The run walked every document and saved the manifest.
    Completed(FetchMetadata),
}

/// What happened to one document's local file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentChange {
    Created,
    Updated,
    Unchanged,
}

impl fmt::Display for DocumentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Mirror state as seen from the manifest alone.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorStatus {
    /// Time of the last completed run.
    pub last_updated: Option<DateTime<Utc>>,
    /// Age of the manifest at the time of the query.
    pub age: Option<chrono::Duration>,
    /// Whether a non-forced `reconcile` would run now.
    pub stale: bool,
    /// Number of tracked files.
    pub files: usize,
    /// Metadata of the last run.
    pub fetch_metadata: Option<FetchMetadata>,
}

/// Lowercase hex SHA-256 of document content.
#[must_use]
pub fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Per-run accumulator.
#[derive(Debug, Default)]
struct RunState {
    files: BTreeMap<String, ManifestEntry>,
    succeeded: usize,
    failed_pages: Vec<String>,
}

/// Orchestrates discovery, per-document fetch and write, and the manifest.
///
/// Documents are processed one at a time with a fixed pause after each
/// successful fetch except the last. A single failing document is recorded
/// and skipped; only discovery failure, an all-failed run, or a manifest
/// write failure end the run with an error.
///
/// # Example
///
/// ```no_run
/// use docmirror_core::config::MirrorConfig;
/// use docmirror_core::sync::{RunOutcome, SyncEngine};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = SyncEngine::with_json_store(MirrorConfig::default(), "./docs")?;
/// match engine.reconcile(false).await? {
///     RunOutcome::Skipped { .. } => println!("mirror is fresh"),
///     RunOutcome::Completed(summary) => {
///         println!("{} fetched, {} failed", summary.pages_fetched_successfully, summary.pages_failed);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SyncEngine<S> {
    config: MirrorConfig,
    discoverer: SourceDiscoverer,
    fetcher: RetryingFetcher,
    store: S,
    docs_dir: PathBuf,
}

impl SyncEngine<JsonManifestStore> {
    /// Creates an engine with its own HTTP client and a JSON manifest in `docs_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_json_store(
        config: MirrorConfig,
        docs_dir: impl Into<PathBuf>,
    ) -> Result<Self, reqwest::Error> {
        let client = HttpClient::with_timeouts(config.connect_timeout_secs, config.read_timeout_secs)?;
        let docs_dir = docs_dir.into();
        let store = JsonManifestStore::new(&docs_dir);
        Ok(Self::new(config, client, store, docs_dir))
    }
}

impl<S: ManifestStore> SyncEngine<S> {
    /// Creates an engine over a shared client and an explicit manifest store.
    #[must_use]
    pub fn new(
        config: MirrorConfig,
        client: HttpClient,
        store: S,
        docs_dir: impl Into<PathBuf>,
    ) -> Self {
        let discoverer = SourceDiscoverer::new(client.clone(), config.discovery_options());
        let fetcher = RetryingFetcher::new(
            client,
            config.retry_policy(),
            ContentValidator::new(config.validation_policy()),
        );
        Self {
            config,
            discoverer,
            fetcher,
            store,
            docs_dir: docs_dir.into(),
        }
    }

    /// Returns the document root.
    #[must_use]
    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    /// Returns the manifest store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reports manifest age and whether a refresh is due, without network I/O.
    pub async fn status(&self) -> MirrorStatus {
        let manifest = self.store.load().await;
        let now = Utc::now();
        MirrorStatus {
            last_updated: manifest.last_updated,
            age: manifest.last_updated.map(|t| now.signed_duration_since(t)),
            stale: is_stale(manifest.last_updated, now, self.config.staleness_threshold()),
            files: manifest.files.len(),
            fetch_metadata: manifest.fetch_metadata,
        }
    }

    /// Runs one reconciliation pass.
    ///
    /// Unless `force` is set, a manifest younger than the staleness threshold
    /// short-circuits to [`RunOutcome::Skipped`] without touching the network
    /// or the manifest.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Discovery`] when no sitemap is usable; nothing is written.
    /// - [`SyncError::AllFailed`] when no document succeeded; the manifest has
    ///   already been saved.
    /// - [`SyncError::Manifest`] or [`SyncError::Io`] on local write failures.
    #[instrument(skip(self), fields(docs_dir = %self.docs_dir.display()))]
    pub async fn reconcile(&self, force: bool) -> Result<RunOutcome, SyncError> {
        let started = Instant::now();
        let prior = self.store.load().await;

        if !force
            && !is_stale(prior.last_updated, Utc::now(), self.config.staleness_threshold())
        {
            info!(last_updated = ?prior.last_updated, "mirror is fresh, skipping");
            return Ok(RunOutcome::Skipped {
                last_updated: prior.last_updated,
            });
        }

        let source = self.discoverer.discover().await.inspect_err(|e| {
            error!(error = %e, "discovery failed, aborting run");
        })?;
        let enumeration = self.discoverer.enumerate(&source.sitemap_url).await;

        tokio::fs::create_dir_all(&self.docs_dir)
            .await
            .map_err(|e| SyncError::io(&self.docs_dir, e))?;

        let mut run = RunState::default();
        let total = enumeration.pages.len();
        for (index, path) in enumeration.pages.iter().enumerate() {
            info!(page = index + 1, total, path = %path, "processing");
            let fetched = match self.fetcher.fetch_document(path, &source.base_url).await {
                Ok(doc) => {
                    let original_url = format!("{}{path}", source.base_url.trim_end_matches('/'));
                    self.record(&prior, &mut run, path, doc, original_url, None)
                        .await;
                    true
                }
                Err(e) => {
                    error!(path = %path, error = %e, "failed to fetch page");
                    Self::record_failure(&prior, &mut run, path, &url_to_safe_filename(path));
                    false
                }
            };
            // Pacing follows every successful fetch, even if the local write failed.
            if fetched && index + 1 < total {
                tokio::time::sleep(self.config.page_delay()).await;
            }
        }

        info!("fetching changelog");
        match self
            .fetcher
            .fetch_changelog(&self.config.changelog_url, &self.config.changelog_page_url)
            .await
        {
            Ok(doc) => {
                self.record(
                    &prior,
                    &mut run,
                    CHANGELOG_FAILURE_ID,
                    doc,
                    self.config.changelog_page_url.clone(),
                    Some(CHANGELOG_SOURCE_TAG.to_string()),
                )
                .await;
            }
            Err(e) => {
                error!(error = %e, "failed to fetch changelog");
                Self::record_failure(&prior, &mut run, CHANGELOG_FAILURE_ID, CHANGELOG_FILENAME);
            }
        }

        self.finalize(run, &source, enumeration.source, total, started)
            .await
    }

    /// Writes a fetched document if needed and records its entry. A failed
    /// write is recorded as a failure of `id`.
    async fn record(
        &self,
        prior: &Manifest,
        run: &mut RunState,
        id: &str,
        doc: FetchedDocument,
        original_url: String,
        source: Option<String>,
    ) {
        let filename = doc.filename.clone();
        match self.apply(prior, doc, original_url, source).await {
            Ok(entry) => {
                run.files.insert(filename, entry);
                run.succeeded += 1;
            }
            Err(e) => {
                error!(filename = %filename, error = %e, "failed to write document");
                Self::record_failure(prior, run, id, &filename);
            }
        }
    }

    /// Hash-compares against the prior entry and writes only on change.
    async fn apply(
        &self,
        prior: &Manifest,
        doc: FetchedDocument,
        original_url: String,
        source: Option<String>,
    ) -> std::io::Result<ManifestEntry> {
        let hash = content_hash(&doc.content);
        let path = self.docs_dir.join(&doc.filename);
        let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);

        let (change, last_updated) = match prior.entry(&doc.filename) {
            Some(previous) if exists && previous.hash == hash => {
                (DocumentChange::Unchanged, previous.last_updated)
            }
            _ => {
                write_atomic(&path, doc.content.as_bytes()).await?;
                let change = if exists {
                    DocumentChange::Updated
                } else {
                    DocumentChange::Created
                };
                (change, Utc::now())
            }
        };
        info!(filename = %doc.filename, change = %change, "document reconciled");

        Ok(ManifestEntry {
            original_url,
            original_content_url: doc.content_url,
            hash,
            last_updated,
            source,
        })
    }

    /// Records a failed identifier, keeping its previous entry if one exists.
    fn record_failure(prior: &Manifest, run: &mut RunState, id: &str, filename: &str) {
        run.failed_pages.push(id.to_string());
        if let Some(previous) = prior.entry(filename) {
            run.files.insert(filename.to_string(), previous.clone());
        }
    }

    async fn finalize(
        &self,
        run: RunState,
        source: &DiscoveredSource,
        discovery_source: DiscoverySource,
        total_pages: usize,
        started: Instant,
    ) -> Result<RunOutcome, SyncError> {
        let metadata = FetchMetadata {
            last_fetch_completed: Utc::now(),
            fetch_duration_seconds: started.elapsed().as_secs_f64(),
            total_pages_discovered: total_pages,
            pages_fetched_successfully: run.succeeded,
            pages_failed: run.failed_pages.len(),
            failed_pages: run.failed_pages,
            sitemap_url: source.sitemap_url.clone(),
            base_url: source.base_url.clone(),
            total_files: run.files.len(),
            discovery_source: Some(discovery_source),
        };

        let manifest = Manifest {
            files: run.files,
            fetch_metadata: Some(metadata.clone()),
            ..Manifest::default()
        };
        self.store.save(manifest).await?;

        info!(
            duration_secs = metadata.fetch_duration_seconds,
            discovered = metadata.total_pages_discovered,
            succeeded = metadata.pages_fetched_successfully,
            failed = metadata.pages_failed,
            discovery_source = %discovery_source,
            "sync run finished"
        );
        for page in &metadata.failed_pages {
            warn!(page = %page, "failed page");
        }

        if metadata.pages_fetched_successfully == 0 {
            error!("no documents fetched successfully");
            return Err(SyncError::AllFailed {
                summary: Box::new(metadata),
            });
        }
        Ok(RunOutcome::Completed(metadata))
    }
}
