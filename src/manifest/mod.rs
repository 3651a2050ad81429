//! Persisted manifest of mirrored documents.
//!
//! The manifest maps each local filename to its remote provenance, content
//! hash and last-write time. It is rewritten as a whole at the end of every
//! run and is the mirror's only durable state.

mod model;
mod store;

pub use model::{FetchMetadata, MANIFEST_SKILL, MANIFEST_SOURCE, Manifest, ManifestEntry};
pub use store::{
    JsonManifestStore, MANIFEST_FILENAME, ManifestError, ManifestStore, MemoryManifestStore,
};
