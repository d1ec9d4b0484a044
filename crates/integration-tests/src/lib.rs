//! Integration tests for the IMPACTO33 storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! task db:start
//! cargo run -p impacto33-cli -- migrate
//!
//! # Start the storefront, then run the ignored tests
//! cargo run -p impacto33-storefront &
//! cargo test -p impacto33-integration-tests -- --ignored
//! ```
//!
//! # Test Files
//!
//! - `storefront_pages` - public pages, 404 fallback and auth redirects
//! - `storefront_feeds` - merchant feed and sitemap headers
//! - `storefront_quote` - quote endpoint validation
//! - `database` - schema created by the migrations
//! - `external_services` - WooCommerce and Supabase connectivity

use reqwest::Client;

/// Base URL of the running storefront (`STOREFRONT_BASE_URL`).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Client that keeps cookies and does not follow redirects, so tests can
/// assert on `Location` headers.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Absolute URL for a storefront path.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", storefront_base_url())
}
