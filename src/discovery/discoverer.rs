//! Sitemap resolution and page enumeration.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::DiscoveryError;
use super::fallback::fallback_pages;
use super::sitemap::parse_sitemap_locs;
use crate::fetch::{HttpClient, find_filename_collisions};

/// Candidate sitemaps, in priority order.
pub const DEFAULT_SITEMAP_URLS: &[&str] = &[
    "https://docs.anthropic.com/sitemap.xml",
    "https://docs.claude.com/sitemap.xml",
];

/// Path fragment a sitemap URL must contain to be mirrored.
pub const DEFAULT_SECTION_PREFIX: &str = "/en/docs/claude-code/";

/// Subtrees excluded from the mirror.
pub const DEFAULT_SKIP_PATTERNS: &[&str] =
    &["/tool-use/", "/examples/", "/legacy/", "/api/", "/reference/"];

/// What to look for and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Candidate sitemap URLs, tried in order.
    pub sitemap_urls: Vec<String>,
    /// Required path fragment.
    pub section_prefix: String,
    /// Path fragments that exclude a page.
    pub skip_patterns: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            sitemap_urls: DEFAULT_SITEMAP_URLS.iter().map(|s| (*s).to_string()).collect(),
            section_prefix: DEFAULT_SECTION_PREFIX.to_string(),
            skip_patterns: DEFAULT_SKIP_PATTERNS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// The sitemap chosen for this run and the host documents are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSource {
    /// Sitemap that answered first.
    pub sitemap_url: String,
    /// Scheme, host and any non-default port of the sitemap's first entry.
    pub base_url: String,
}

/// Where an enumerated page list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    /// Parsed from the live sitemap.
    Sitemap,
    /// The built-in fallback list.
    Fallback,
}

impl std::fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sitemap => write!(f, "sitemap"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Ordered document identifiers for one run. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    /// Document identifiers, sorted unless they came from the fallback list.
    pub pages: Vec<String>,
    /// Origin of `pages`.
    pub source: DiscoverySource,
}

impl Enumeration {
    fn fallback() -> Self {
        Self {
            pages: fallback_pages(),
            source: DiscoverySource::Fallback,
        }
    }
}

/// Resolves the remote sitemap and enumerates the pages to mirror.
#[derive(Debug, Clone)]
pub struct SourceDiscoverer {
    client: HttpClient,
    options: DiscoveryOptions,
}

impl SourceDiscoverer {
    /// Creates a discoverer over a shared client.
    #[must_use]
    pub fn new(client: HttpClient, options: DiscoveryOptions) -> Self {
        Self { client, options }
    }

    /// Tries each candidate sitemap in order and returns the first that lists
    /// at least one URL with a host.
    ///
    /// Only the first `<loc>` is inspected here; [`Self::enumerate`] parses
    /// the full set.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::NoSitemap`] when no candidate is usable.
    #[instrument(skip(self))]
    pub async fn discover(&self) -> Result<DiscoveredSource, DiscoveryError> {
        for sitemap_url in &self.options.sitemap_urls {
            info!(sitemap = %sitemap_url, "trying sitemap");
            match self.probe(sitemap_url).await {
                Ok(base_url) => {
                    info!(sitemap = %sitemap_url, base_url = %base_url, "sitemap found");
                    return Ok(DiscoveredSource {
                        sitemap_url: sitemap_url.clone(),
                        base_url,
                    });
                }
                Err(error) => warn!(error = %error, "sitemap candidate rejected"),
            }
        }
        Err(DiscoveryError::NoSitemap {
            tried: self.options.sitemap_urls.len(),
        })
    }

    async fn probe(&self, sitemap_url: &str) -> Result<String, DiscoveryError> {
        let locs = self.fetch_locs(sitemap_url).await?;
        let first = locs
            .first()
            .ok_or_else(|| DiscoveryError::sitemap(sitemap_url, "sitemap lists no URLs"))?;
        base_url_of(first).ok_or_else(|| {
            DiscoveryError::sitemap(sitemap_url, format!("first entry has no host: {first}"))
        })
    }

    /// Lists the document identifiers to mirror.
    ///
    /// Keeps URLs containing the section prefix, strips a trailing `.html` or
    /// `/`, drops skipped subtrees, deduplicates and sorts. Identifiers whose
    /// filename collides with an earlier one are dropped. Any failure, or an
    /// empty result, yields the fallback list instead.
    #[instrument(skip(self))]
    pub async fn enumerate(&self, sitemap_url: &str) -> Enumeration {
        let locs = match self.fetch_locs(sitemap_url).await {
            Ok(locs) => locs,
            Err(error) => {
                warn!(error = %error, "page discovery failed, using fallback list");
                return Enumeration::fallback();
            }
        };
        info!(total = locs.len(), "sitemap parsed");

        let pages = self.select_pages(&locs);
        if pages.is_empty() {
            warn!("no pages matched in sitemap, using fallback list");
            return Enumeration::fallback();
        }

        info!(pages = pages.len(), "discovered documentation pages");
        Enumeration {
            pages,
            source: DiscoverySource::Sitemap,
        }
    }

    async fn fetch_locs(&self, sitemap_url: &str) -> Result<Vec<String>, DiscoveryError> {
        let body = self
            .client
            .get_text(sitemap_url)
            .await
            .map_err(|e| DiscoveryError::sitemap(sitemap_url, e.to_string()))?;
        parse_sitemap_locs(&body).map_err(|e| DiscoveryError::sitemap(sitemap_url, e.to_string()))
    }

    /// Applies the prefix, normalization, skip, dedupe, sort and collision
    /// rules to raw sitemap URLs.
    #[must_use]
    pub fn select_pages(&self, locs: &[String]) -> Vec<String> {
        let mut unique = BTreeSet::new();
        for loc in locs {
            if !loc.contains(&self.options.section_prefix) {
                continue;
            }
            let Ok(url) = Url::parse(loc) else {
                debug!(loc = %loc, "skipping unparsable sitemap entry");
                continue;
            };
            let path = normalize_path(url.path());
            if self
                .options
                .skip_patterns
                .iter()
                .any(|skip| path.contains(skip.as_str()))
            {
                continue;
            }
            unique.insert(path.to_string());
        }

        let pages: Vec<String> = unique.into_iter().collect();
        drop_colliding(pages)
    }
}

fn normalize_path(path: &str) -> &str {
    if let Some(stripped) = path.strip_suffix(".html") {
        stripped
    } else if let Some(stripped) = path.strip_suffix('/') {
        stripped
    } else {
        path
    }
}

fn drop_colliding(pages: Vec<String>) -> Vec<String> {
    let collisions = find_filename_collisions(pages.iter().map(String::as_str));
    if collisions.is_empty() {
        return pages;
    }
    let mut dropped = HashSet::new();
    for collision in collisions {
        warn!(
            filename = %collision.filename,
            kept = %collision.first,
            dropped = %collision.second,
            "filename collision, dropping later page"
        );
        dropped.insert(collision.second);
    }
    pages.into_iter().filter(|page| !dropped.contains(page)).collect()
}

/// Returns `scheme://host[:port]` for an absolute URL. The port is kept only
/// when it is not the scheme's default.
fn base_url_of(loc: &str) -> Option<String> {
    let url = Url::parse(loc).ok()?;
    let host = url.host_str()?;
    let mut base = format!("{}://{host}", url.scheme());
    if let Some(port) = url.port() {
        base.push_str(&format!(":{port}"));
    }
    Some(base)
}
