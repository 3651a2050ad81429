//! Plausibility checks for fetched documentation bodies.
//!
//! A mirror host that is down, redirecting, or rate limiting often answers with
//! a 200 and an HTML error page or a short placeholder. [`ContentValidator`]
//! rejects such bodies before they overwrite a good local copy.
//!
//! The markdown check is a heuristic: it counts marker occurrences in the
//! first lines of the document. Thresholds live in [`ValidationPolicy`] so they
//! can be tuned without code changes.

use thiserror::Error;

/// Minimum trimmed length for a regular documentation page.
pub const DEFAULT_MIN_PAGE_LENGTH: usize = 50;

/// Minimum trimmed length for the changelog (including its attribution header).
pub const DEFAULT_MIN_CHANGELOG_LENGTH: usize = 100;

/// Minimum number of markdown marker occurrences required.
pub const DEFAULT_MIN_MARKDOWN_INDICATORS: usize = 3;

/// Number of leading lines scanned for markdown markers.
pub const DEFAULT_INDICATOR_SCAN_LINES: usize = 50;

/// Number of leading characters searched for an `<html` tag.
const HTML_SNIFF_CHARS: usize = 100;

/// Markers counted by the markdown density check.
const MARKDOWN_INDICATORS: &[&str] = &[
    "# ", "## ", "### ", "```", "- ", "* ", "1. ", "[", "**", "_", "> ",
];

/// Reasons a fetched body is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Empty body or an HTML document where markdown was expected.
    #[error("received HTML instead of markdown")]
    HtmlResponse,

    /// Body shorter than the profile's minimum after trimming.
    #[error("content too short ({length} bytes, minimum {minimum})")]
    TooShort {
        /// Trimmed length in bytes.
        length: usize,
        /// Required minimum.
        minimum: usize,
    },

    /// Too few markdown markers in the scanned prefix.
    #[error("content does not appear to be markdown ({indicators} indicators found, minimum {minimum})")]
    NotMarkdown {
        /// Marker occurrences found.
        indicators: usize,
        /// Required minimum.
        minimum: usize,
    },
}

/// Which failure profile a body is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationProfile {
    /// A regular documentation page.
    Page,
    /// The changelog, which has its own length threshold.
    Changelog,
}

/// Tunable thresholds for [`ContentValidator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Minimum trimmed length for pages.
    pub min_page_length: usize,
    /// Minimum trimmed length for the changelog.
    pub min_changelog_length: usize,
    /// Minimum marker occurrences within the scanned lines.
    pub min_markdown_indicators: usize,
    /// Number of leading lines scanned for markers.
    pub indicator_scan_lines: usize,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_page_length: DEFAULT_MIN_PAGE_LENGTH,
            min_changelog_length: DEFAULT_MIN_CHANGELOG_LENGTH,
            min_markdown_indicators: DEFAULT_MIN_MARKDOWN_INDICATORS,
            indicator_scan_lines: DEFAULT_INDICATOR_SCAN_LINES,
        }
    }
}

/// Decides whether a fetched body is plausible documentation.
#[derive(Debug, Clone, Default)]
pub struct ContentValidator {
    policy: ValidationPolicy,
}

impl ContentValidator {
    /// Creates a validator with the given thresholds.
    #[must_use]
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    /// Checks `content` against the thresholds for `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the body is empty or HTML, shorter than
    /// the profile minimum, or has too few markdown markers.
    pub fn validate(
        &self,
        content: &str,
        profile: ValidationProfile,
    ) -> Result<(), ValidationError> {
        if content.is_empty() || looks_like_html(content) {
            return Err(ValidationError::HtmlResponse);
        }

        let minimum = match profile {
            ValidationProfile::Page => self.policy.min_page_length,
            ValidationProfile::Changelog => self.policy.min_changelog_length,
        };
        let length = content.trim().len();
        if length < minimum {
            return Err(ValidationError::TooShort { length, minimum });
        }

        let indicators = count_markdown_indicators(content, self.policy.indicator_scan_lines);
        if indicators < self.policy.min_markdown_indicators {
            return Err(ValidationError::NotMarkdown {
                indicators,
                minimum: self.policy.min_markdown_indicators,
            });
        }

        Ok(())
    }
}

fn looks_like_html(content: &str) -> bool {
    let head = content.trim_start();
    let prefix: String = head.chars().take(HTML_SNIFF_CHARS).collect();
    let prefix = prefix.to_ascii_lowercase();
    prefix.starts_with("<!doctype") || prefix.contains("<html")
}

/// Counts marker occurrences in the first `scan_lines` lines.
///
/// Each marker counts at most once per line, so a line like `- **bold**`
/// contributes two.
fn count_markdown_indicators(content: &str, scan_lines: usize) -> usize {
    content
        .lines()
        .take(scan_lines)
        .map(|line| {
            let trimmed = line.trim();
            MARKDOWN_INDICATORS
                .iter()
                .filter(|marker| trimmed.starts_with(*marker) || line.contains(*marker))
                .count()
        })
        .sum()
}
