//! Docmirror Core Library
//!
//! Keeps a local mirror of a remote documentation corpus fresh without
//! redundant network traffic.
//!
//! # Architecture
//!
//! The library is organized into the following modules, leaves first:
//! - [`validate`] - Plausibility checks on fetched documents
//! - [`fetch`] - HTTP client, retry policy and per-document fetcher
//! - [`discovery`] - Sitemap resolution, page enumeration and fallback list
//! - [`manifest`] - Persisted manifest and its store seam
//! - [`sync`] - The reconciliation engine, staleness gate and optional lock
//! - [`config`] - Tunables and config file loading

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod atomic;
pub mod config;
pub mod discovery;
pub mod fetch;
pub mod manifest;
pub mod sync;
mod user_agent;
pub mod validate;

// Re-export commonly used types
pub use config::{LoadedConfig, MirrorConfig, load_config};
pub use discovery::{DiscoveryError, DiscoverySource, SourceDiscoverer};
pub use fetch::{FetchError, HttpClient, RetryPolicy, RetryingFetcher};
pub use manifest::{
    FetchMetadata, JsonManifestStore, Manifest, ManifestEntry, ManifestError, ManifestStore,
    MemoryManifestStore,
};
pub use sync::{MirrorLock, MirrorStatus, RunOutcome, SyncEngine, SyncError};
pub use validate::{ContentValidator, ValidationError};
