//! Sync/reconciliation engine.
//!
//! # Overview
//!
//! A run moves through these steps:
//!
//! 1. **Staleness gate**: a manifest younger than the threshold ends the run
//!    with nothing done (unless forced).
//! 2. **Discover**: pick a sitemap and base URL; failure aborts the run.
//! 3. **Reconcile each page**: fetch, validate, hash, and write only when the
//!    hash changed or the file is missing.
//! 4. **Reconcile the changelog** from its own host.
//! 5. **Finalize**: save the rebuilt manifest, then fail if nothing succeeded.
//!
//! Runs over the same document root are not serialized by the engine; see
//! [`MirrorLock`] for callers that need that.

mod engine;
mod error;
mod lock;
mod staleness;

pub use engine::{
    CHANGELOG_FAILURE_ID, CHANGELOG_SOURCE_TAG, DocumentChange, MirrorStatus, RunOutcome,
    SyncEngine, content_hash,
};
pub use error::SyncError;
pub use lock::{LOCK_FILENAME, LockError, MirrorLock};
pub use staleness::is_stale;
