//! Integration tests for the merchant feed and sitemaps.
//!
//! These tests require the storefront running with a reachable WooCommerce
//! GraphQL endpoint.

use impacto33_integration_tests::{client, url};
use impacto33_storefront::feeds::sitemap::{PAGES_SITEMAP, PRODUCTS_SITEMAP};
use reqwest::StatusCode;
use serde_json::Value;

fn header(resp: &reqwest::Response, name: &str) -> String {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
#[ignore = "Requires running storefront server and WooCommerce"]
async fn test_feed_cache_miss_then_hit() {
    let client = client();
    client
        .post(url("/feeds/google.xml/clear-cache"))
        .send()
        .await
        .unwrap();

    let first = client.get(url("/feeds/google.xml")).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header(&first, "x-cache-status"), "MISS");
    assert_eq!(header(&first, "content-type"), "application/xml; charset=utf-8");
    assert_eq!(header(&first, "cache-control"), "public, max-age=900");

    let second = client.get(url("/feeds/google.xml")).send().await.unwrap();
    assert_eq!(header(&second, "x-cache-status"), "HIT");
    assert_eq!(first.text().await.unwrap(), second.text().await.unwrap());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_clear_cache_response() {
    let resp = client()
        .post(url("/feeds/google.xml/clear-cache"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Cache cleared successfully");
}

#[tokio::test]
#[ignore = "Requires running storefront server and WooCommerce"]
async fn test_feed_stats() {
    let resp = client()
        .get(url("/feeds/google.xml/stats"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert!(body.is_object());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_sitemap_index_lists_children() {
    let resp = client().get(url("/sitemap.xml")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "cache-control"), "public, max-age=3600");

    let body = resp.text().await.unwrap();
    assert!(body.contains("<sitemapindex"));
    assert!(body.contains(PAGES_SITEMAP));
    assert!(body.contains(PRODUCTS_SITEMAP));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_pages_sitemap() {
    let resp = client()
        .get(url(&format!("/{PAGES_SITEMAP}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.unwrap();
    assert!(body.contains("<urlset"));
    assert!(body.contains("/ropa-personalizada/"));
}
