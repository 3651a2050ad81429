//! Integration tests for sitemap discovery and page enumeration.

mod support;

use docmirror_core::discovery::{
    DiscoveryError, DiscoveryOptions, DiscoverySource, FALLBACK_PAGES, SourceDiscoverer,
};
use docmirror_core::HttpClient;
use support::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn discoverer(sitemap_urls: Vec<String>) -> SourceDiscoverer {
    SourceDiscoverer::new(
        HttpClient::new().expect("client"),
        DiscoveryOptions {
            sitemap_urls,
            ..DiscoveryOptions::default()
        },
    )
}

async fn mount_body(server: &MockServer, at: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(at.to_string()))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_discover_uses_first_usable_candidate() {
    let server = MockServer::start().await;
    mount_sitemap(&server, &["overview"]).await;
    mount_body(&server, "/other.xml", 200, &sitemap_xml(&server, &["hooks"])).await;

    let source = discoverer(vec![
        format!("{}/sitemap.xml", server.uri()),
        format!("{}/other.xml", server.uri()),
    ])
    .discover()
    .await
    .expect("discovery should succeed");

    assert_eq!(source.sitemap_url, format!("{}/sitemap.xml", server.uri()));
    // Non-default port is kept.
    assert_eq!(source.base_url, server.uri());
    assert_eq!(request_count(&server, "/other.xml").await, 0);
}

#[tokio::test]
async fn test_discover_falls_through_failing_candidates() {
    let server = MockServer::start().await;
    mount_body(&server, "/missing.xml", 404, "").await;
    mount_body(&server, "/empty.xml", 200, "<urlset></urlset>").await;
    mount_body(&server, "/broken.xml", 200, "<urlset><url><loc>x").await;
    mount_sitemap(&server, &["overview"]).await;

    let candidates = ["/missing.xml", "/empty.xml", "/broken.xml", "/sitemap.xml"]
        .iter()
        .map(|p| format!("{}{p}", server.uri()))
        .collect();
    let source = discoverer(candidates)
        .discover()
        .await
        .expect("last candidate should win");

    assert_eq!(source.sitemap_url, format!("{}/sitemap.xml", server.uri()));
}

#[tokio::test]
async fn test_discover_reports_no_sitemap_when_all_fail() {
    let server = MockServer::start().await;
    mount_body(&server, "/a.xml", 500, "").await;
    mount_body(&server, "/b.xml", 200, "<html>not a sitemap</html>").await;

    let err = discoverer(vec![
        format!("{}/a.xml", server.uri()),
        format!("{}/b.xml", server.uri()),
    ])
    .discover()
    .await
    .expect_err("no candidate is usable");

    assert_eq!(err, DiscoveryError::NoSitemap { tried: 2 });
}

#[tokio::test]
async fn test_discover_rejects_relative_first_loc() {
    let server = MockServer::start().await;
    mount_body(
        &server,
        "/sitemap.xml",
        200,
        "<urlset><url><loc>/en/docs/claude-code/overview</loc></url></urlset>",
    )
    .await;

    let err = discoverer(vec![format!("{}/sitemap.xml", server.uri())])
        .discover()
        .await
        .expect_err("relative loc has no host");

    assert!(matches!(err, DiscoveryError::NoSitemap { tried: 1 }));
}

#[tokio::test]
async fn test_enumerate_filters_normalizes_and_sorts() {
    let server = MockServer::start().await;
    let base = server.uri();
    let xml = format!(
        "<urlset>\
         <url><loc>{base}{PREFIX}settings.html</loc></url>\
         <url><loc>{base}{PREFIX}overview/</loc></url>\
         <url><loc>{base}{PREFIX}hooks</loc></url>\
         <url><loc>{base}{PREFIX}hooks</loc></url>\
         <url><loc>{base}{PREFIX}api/internal</loc></url>\
         <url><loc>{base}/en/api/messages</loc></url>\
         </urlset>"
    );
    mount_body(&server, "/sitemap.xml", 200, &xml).await;

    let enumeration = discoverer(vec![])
        .enumerate(&format!("{base}/sitemap.xml"))
        .await;

    assert_eq!(enumeration.source, DiscoverySource::Sitemap);
    assert_eq!(
        enumeration.pages,
        vec![page_path("hooks"), page_path("overview"), page_path("settings")]
    );
}

#[tokio::test]
async fn test_enumerate_falls_back_on_http_error() {
    let server = MockServer::start().await;
    mount_body(&server, "/sitemap.xml", 500, "").await;

    let enumeration = discoverer(vec![])
        .enumerate(&format!("{}/sitemap.xml", server.uri()))
        .await;

    assert_eq!(enumeration.source, DiscoverySource::Fallback);
    assert_eq!(enumeration.pages.len(), FALLBACK_PAGES.len());
}

#[tokio::test]
async fn test_enumerate_falls_back_on_malformed_xml() {
    let server = MockServer::start().await;
    mount_body(&server, "/sitemap.xml", 200, "<urlset><url><loc>").await;

    let enumeration = discoverer(vec![])
        .enumerate(&format!("{}/sitemap.xml", server.uri()))
        .await;

    assert_eq!(enumeration.source, DiscoverySource::Fallback);
}

#[tokio::test]
async fn test_enumerate_falls_back_when_nothing_matches() {
    let server = MockServer::start().await;
    let xml = format!(
        "<urlset><url><loc>{}/en/docs/other-product/intro</loc></url></urlset>",
        server.uri()
    );
    mount_body(&server, "/sitemap.xml", 200, &xml).await;

    let enumeration = discoverer(vec![])
        .enumerate(&format!("{}/sitemap.xml", server.uri()))
        .await;

    assert_eq!(enumeration.source, DiscoverySource::Fallback);
    assert_eq!(
        enumeration.pages,
        FALLBACK_PAGES.iter().map(|p| (*p).to_string()).collect::<Vec<_>>()
    );
}
