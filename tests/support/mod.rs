//! Shared helpers for mirror integration tests: a wiremock-backed fake
//! documentation host and a zero-delay configuration pointed at it.

#![allow(dead_code)]

use docmirror_core::MirrorConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Section prefix used by every fake page.
pub const PREFIX: &str = "/en/docs/claude-code/";

/// Raw changelog path on the fake host.
pub const CHANGELOG_PATH: &str = "/raw/CHANGELOG.md";

/// Changelog page path on the fake host.
pub const CHANGELOG_PAGE_PATH: &str = "/blob/CHANGELOG.md";

/// Builds a markdown page that passes default validation.
pub fn page_body(title: &str) -> String {
    format!(
        "# {title}\n\n## Overview\n\nThis page documents **{title}** in detail.\n\n\
         - first point\n- second point\n\nSee [the guide](https://example.com/guide).\n"
    )
}

/// Builds a changelog body that passes default validation.
pub fn changelog_body(version: &str) -> String {
    format!(
        "# Changelog\n\n## {version}\n\n- Fixed a crash when hooks time out\n\
         - Improved startup time on large repositories\n\n## 0.9.0\n\n- Initial public release\n"
    )
}

/// Builds a sitemap listing `pages` (names relative to [`PREFIX`]) on `server`.
pub fn sitemap_xml(server: &MockServer, pages: &[&str]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
"#,
    );
    for page in pages {
        xml.push_str(&format!(
            "  <url><loc>{}{PREFIX}{page}</loc></url>\n",
            server.uri()
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Full identifier for a page name.
pub fn page_path(name: &str) -> String {
    format!("{PREFIX}{name}")
}

/// Mounts `/sitemap.xml` listing `pages`.
pub async fn mount_sitemap(server: &MockServer, pages: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(server, pages)))
        .mount(server)
        .await;
}

/// Mounts the markdown endpoint of page `name` with `body`.
pub async fn mount_page(server: &MockServer, name: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}{name}.md")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts the markdown endpoint of page `name` with a fixed status.
pub async fn mount_page_status(server: &MockServer, name: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}{name}.md")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts the raw changelog with `body`.
pub async fn mount_changelog(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path(CHANGELOG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts a sitemap, one valid page per name, and a valid changelog.
pub async fn mount_healthy_mirror(server: &MockServer, pages: &[&str]) {
    mount_sitemap(server, pages).await;
    for page in pages {
        mount_page(server, page, &page_body(page)).await;
    }
    mount_changelog(server, &changelog_body("1.0.0")).await;
}

/// Configuration pointed at `server` with all delays disabled.
pub fn test_config(server: &MockServer) -> MirrorConfig {
    MirrorConfig {
        sitemap_urls: vec![format!("{}/sitemap.xml", server.uri())],
        changelog_url: format!("{}{CHANGELOG_PATH}", server.uri()),
        changelog_page_url: format!("{}{CHANGELOG_PAGE_PATH}", server.uri()),
        page_delay_ms: 0,
        retry_base_delay_ms: 0,
        retry_max_delay_ms: 0,
        default_retry_after_secs: 0,
        connect_timeout_secs: 5,
        read_timeout_secs: 5,
        ..MirrorConfig::default()
    }
}

/// Number of requests the server has seen for `request_path`.
pub async fn request_count(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == request_path)
        .count()
}

/// Total number of requests the server has seen.
pub async fn total_requests(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}
