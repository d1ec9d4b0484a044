//! Integration tests for public storefront pages.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The storefront running (cargo run -p impacto33-storefront)
//!
//! Run with: cargo test -p impacto33-integration-tests -- --ignored

use impacto33_integration_tests::{client, url};
use impacto33_storefront::routes::pages::INFO_PAGES;
use reqwest::StatusCode;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = client().get(url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_readiness() {
    let resp = client().get(url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Pages
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_landing_page() {
    let resp = client().get(url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let csp = resp
        .headers()
        .get("content-security-policy")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(csp.contains("'nonce-"), "CSP should carry a nonce: {csp}");

    let body = resp.text().await.unwrap();
    assert!(body.contains("IMPACTO33"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_info_pages_render() {
    let client = client();
    for path in INFO_PAGES {
        let resp = client.get(url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server and WooCommerce"]
async fn test_seo_category_page() {
    let resp = client()
        .get(url("/ropa-personalizada/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_path_is_not_found() {
    let resp = client()
        .get(url("/esta-ruta-no-existe/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_service_is_not_found() {
    let resp = client()
        .get(url("/servicios/no-existe"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_account_redirects_to_login() {
    for path in ["/mi-cuenta", "/mis-pedidos", "/mis-favoritos", "/carrito"] {
        let resp = client().get(url(path)).send().await.unwrap();
        assert!(resp.status().is_redirection(), "{path}: {}", resp.status());
        assert_eq!(
            resp.headers().get("location").unwrap(),
            "/auth/login",
            "{path}"
        );
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_htmx_request_gets_hx_redirect() {
    let resp = client()
        .post(url("/carrito/clear"))
        .header("HX-Request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("hx-redirect").unwrap(), "/auth/login");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_anonymous_cart_count_is_zero() {
    let resp = client().get(url("/carrito/count")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(!body.contains("cart-badge"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_login_page_renders() {
    let resp = client().get(url("/auth/login")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("name=\"password\""));
}
