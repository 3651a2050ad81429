//! Minimal sitemap parsing: `<urlset><url><loc>…</loc></url></urlset>`.
//!
//! Sitemap indexes and other roots are rejected; the mirror only follows
//! flat URL sets.

use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;

/// Reasons a sitemap body cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SitemapError {
    /// The body is not well-formed XML.
    #[error("malformed sitemap XML: {0}")]
    Xml(String),

    /// The document root is something other than `urlset`.
    #[error("expected <urlset> root, found <{root}>")]
    NotUrlSet {
        /// Local name of the root element.
        root: String,
    },

    /// The body contains no elements at all.
    #[error("sitemap has no root element")]
    Empty,
}

/// Returns every `<loc>` inside a `<url>` entry, in document order.
///
/// # Errors
///
/// Returns [`SitemapError`] when the XML is malformed, empty, or not a URL set.
pub fn parse_sitemap_locs(xml: &str) -> Result<Vec<String>, SitemapError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root_seen = false;
    let mut in_url = false;
    let mut in_loc = false;
    let mut current = String::new();
    let mut locs = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let name = element.local_name();
                if !root_seen {
                    root_seen = true;
                    if name.as_ref() != b"urlset" {
                        return Err(SitemapError::NotUrlSet {
                            root: String::from_utf8_lossy(name.as_ref()).into_owned(),
                        });
                    }
                    continue;
                }
                match name.as_ref() {
                    b"url" => in_url = true,
                    b"loc" if in_url => {
                        in_loc = true;
                        current.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(element)) if !root_seen => {
                return Err(SitemapError::NotUrlSet {
                    root: String::from_utf8_lossy(element.local_name().as_ref()).into_owned(),
                });
            }
            Ok(Event::End(element)) => match element.local_name().as_ref() {
                b"url" => in_url = false,
                b"loc" if in_loc => {
                    in_loc = false;
                    let loc = current.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                }
                _ => {}
            },
            Ok(Event::Text(text)) if in_loc => {
                let text = text
                    .unescape()
                    .map_err(|e| SitemapError::Xml(e.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::CData(data)) if in_loc => {
                current.push_str(&String::from_utf8_lossy(&data.into_inner()));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SitemapError::Xml(e.to_string())),
            Ok(_) => {}
        }
    }

    if !root_seen {
        return Err(SitemapError::Empty);
    }
    Ok(locs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_locs_in_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://docs.example.com/en/docs/claude-code/overview</loc><lastmod>2025-01-01</lastmod></url>
  <url><loc> https://docs.example.com/en/docs/claude-code/hooks </loc></url>
</urlset>"#;
        assert_eq!(
            parse_sitemap_locs(xml).unwrap(),
            vec![
                "https://docs.example.com/en/docs/claude-code/overview",
                "https://docs.example.com/en/docs/claude-code/hooks",
            ]
        );
    }

    #[test]
    fn test_unescapes_entities() {
        let xml = "<urlset><url><loc>https://x.com/a?b=1&amp;c=2</loc></url></urlset>";
        assert_eq!(parse_sitemap_locs(xml).unwrap(), vec!["https://x.com/a?b=1&c=2"]);
    }

    #[test]
    fn test_empty_urlset_yields_no_locs() {
        assert!(parse_sitemap_locs("<urlset></urlset>").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_sitemap_index() {
        let xml = "<sitemapindex><sitemap><loc>https://x.com/s1.xml</loc></sitemap></sitemapindex>";
        assert_eq!(
            parse_sitemap_locs(xml),
            Err(SitemapError::NotUrlSet {
                root: "sitemapindex".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_html_body() {
        let err = parse_sitemap_locs("<html><body>Not found</body></html>").unwrap_err();
        assert!(matches!(err, SitemapError::NotUrlSet { .. }));
    }

    #[test]
    fn test_rejects_plain_text() {
        assert_eq!(parse_sitemap_locs("service unavailable"), Err(SitemapError::Empty));
    }

    #[test]
    fn test_rejects_mismatched_tags() {
        let err = parse_sitemap_locs("<urlset><url><loc>x</url></urlset>").unwrap_err();
        assert!(matches!(err, SitemapError::Xml(_)));
    }
}
