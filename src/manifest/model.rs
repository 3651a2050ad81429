//! Serialized manifest shape.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::discovery::DiscoverySource;

/// Documentation root recorded as the manifest's provenance.
pub const MANIFEST_SOURCE: &str = "https://docs.anthropic.com/en/docs/claude-code/";

/// Name tag recorded in every saved manifest.
pub const MANIFEST_SKILL: &str = "claude-code-knowledge";

/// Persisted mapping from local filename to remote provenance and content hash.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Entries keyed by local filename.
    #[serde(default)]
    pub files: BTreeMap<String, ManifestEntry>,

    /// Time of the last completed save. Drives the staleness gate.
    #[serde(
        default,
        deserialize_with = "deserialize_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,

    /// Documentation root the mirror tracks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Name tag of the mirror.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,

    /// Observational summary of the run that wrote this manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_metadata: Option<FetchMetadata>,
}

impl Manifest {
    /// Looks up the entry for a local filename.
    #[must_use]
    pub fn entry(&self, filename: &str) -> Option<&ManifestEntry> {
        self.files.get(filename)
    }

    /// Returns a copy stamped with `now` and the fixed provenance fields.
    #[must_use]
    pub fn stamped(mut self, now: DateTime<Utc>) -> Self {
        self.last_updated = Some(now);
        self.source = Some(MANIFEST_SOURCE.to_string());
        self.skill = Some(MANIFEST_SKILL.to_string());
        self
    }
}

/// Provenance and version of one mirrored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Human-facing URL of the document.
    #[serde(default)]
    pub original_url: String,

    /// URL the content bytes were fetched from.
    #[serde(default, alias = "original_md_url", alias = "original_raw_url")]
    pub original_content_url: String,

    /// Lowercase hex SHA-256 of the written bytes.
    pub hash: String,

    /// Time the file was last written (not last checked).
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_updated: DateTime<Utc>,

    /// Origin tag for documents outside the sitemap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Summary of one sync run. Never read back for control decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchMetadata {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_fetch_completed: DateTime<Utc>,
    pub fetch_duration_seconds: f64,
    pub total_pages_discovered: usize,
    pub pages_fetched_successfully: usize,
    pub pages_failed: usize,
    pub failed_pages: Vec<String>,
    pub sitemap_url: String,
    pub base_url: String,
    pub total_files: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_source: Option<DiscoverySource>,
}

/// Parses an RFC 3339 timestamp, or one without an offset (older mirrors
/// wrote local `isoformat()` strings), which is read as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| raw.parse::<NaiveDateTime>().map(|t| t.and_utc()))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_timestamp(&raw).map_err(serde::de::Error::custom))
        .transpose()
}
