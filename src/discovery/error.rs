use thiserror::Error;

/// Errors raised while locating the remote sitemap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// Every candidate sitemap was unreachable, unparsable, or empty.
    #[error("no usable sitemap found after trying {tried} candidate(s)")]
    NoSitemap {
        /// Number of candidates tried.
        tried: usize,
    },

    /// One sitemap could not be fetched or parsed.
    #[error("sitemap {url} unusable: {reason}")]
    Sitemap {
        /// The sitemap URL.
        url: String,
        /// Human-readable cause.
        reason: String,
    },
}

impl DiscoveryError {
    /// Creates a per-sitemap error.
    #[must_use]
    pub fn sitemap(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Sitemap {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_sitemap_message_counts_candidates() {
        let err = DiscoveryError::NoSitemap { tried: 2 };
        assert_eq!(err.to_string(), "no usable sitemap found after trying 2 candidate(s)");
    }

    #[test]
    fn test_sitemap_message_names_url() {
        let err = DiscoveryError::sitemap("https://x.com/sitemap.xml", "HTTP 404");
        assert!(err.to_string().contains("https://x.com/sitemap.xml"));
        assert!(err.to_string().contains("HTTP 404"));
    }
}
