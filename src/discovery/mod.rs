//! Remote source discovery.
//!
//! - [`SourceDiscoverer::discover`] picks the first usable candidate sitemap
//!   and derives the base URL documents are fetched from.
//! - [`SourceDiscoverer::enumerate`] lists the document identifiers to
//!   mirror, falling back to [`FALLBACK_PAGES`] when the sitemap is
//!   unusable or matches nothing.

mod discoverer;
mod error;
mod fallback;
mod sitemap;

pub use discoverer::{
    DEFAULT_SECTION_PREFIX, DEFAULT_SITEMAP_URLS, DEFAULT_SKIP_PATTERNS, DiscoveredSource,
    DiscoveryOptions, DiscoverySource, Enumeration, SourceDiscoverer,
};
pub use error::DiscoveryError;
pub use fallback::{FALLBACK_PAGES, fallback_pages};
pub use sitemap::{SitemapError, parse_sitemap_locs};
