//! Shared User-Agent string for mirror HTTP traffic.
//!
//! Sitemap, page and changelog requests all identify the tool the same way so
//! upstream operators can attribute and throttle mirror traffic.

/// Project URL for User-Agent identification (RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/docmirror";

/// Default User-Agent for every mirror request.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("docmirror/{version} (documentation-mirror; +{PROJECT_UA_URL})")
}
