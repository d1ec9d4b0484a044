//! Google Merchant feed and sitemap handlers.

use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::feeds::{FeedStats, generate_feed, merchant::fetch_feed_products, sitemap};
use crate::state::AppState;

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const SITEMAP_CACHE_CONTROL: &str = "public, max-age=3600";
const FEED_CACHE_CONTROL: &str = "public, max-age=900";

fn xml(body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, XML_CONTENT_TYPE),
            (header::CACHE_CONTROL, SITEMAP_CACHE_CONTROL),
        ],
        body,
    )
        .into_response()
}

/// `GET /feeds/google.xml`, served from a 15 minute cache. Requests that
/// arrive while the feed is being rebuilt wait for that build.
#[instrument(skip(state))]
pub async fn google_feed(State(state): State<AppState>) -> Response {
    let (feed, hit) = state
        .feed_cache()
        .get_or_generate(|| generate_feed(state.catalog(), &state.config().base_url))
        .await;
    let cache_status = if hit { "HIT" } else { "MISS" };

    (
        [
            (header::CONTENT_TYPE, XML_CONTENT_TYPE),
            (header::CACHE_CONTROL, FEED_CACHE_CONTROL),
            (header::HeaderName::from_static("x-cache-status"), cache_status),
        ],
        feed.xml.clone(),
    )
        .into_response()
}

/// Body of the cache clear endpoint.
#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `POST /feeds/google.xml/clear-cache`
#[instrument(skip(state))]
pub async fn clear_cache(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    state.feed_cache().clear().await;
    state.catalog().invalidate_cache();
    tracing::info!("Merchant feed and catalog caches cleared");
    Json(ClearCacheResponse {
        success: true,
        message: "Cache cleared successfully",
    })
}

/// `GET /feeds/google.xml/stats`
///
/// Product counts come from a fresh catalog fetch; the item total from the
/// cached feed when one is live.
#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> Json<FeedStats> {
    let (products, cache_state, cached) = tokio::join!(
        fetch_feed_products(state.catalog()),
        state.feed_cache().state(),
        state.feed_cache().get(),
    );
    Json(FeedStats::new(
        &products,
        cache_state,
        cached.map(|feed| feed.item_count),
    ))
}

/// `GET /sitemap.xml`
pub async fn sitemap_index(State(state): State<AppState>) -> Response {
    xml(sitemap::sitemap_index(&state.config().base_url, Utc::now()))
}

/// `GET /sitemap-pages.xml`
pub async fn pages_sitemap(State(state): State<AppState>) -> Response {
    xml(sitemap::pages_sitemap(&state.config().base_url, state.content()))
}

/// `GET /sitemap-products.xml`
#[instrument(skip(state))]
pub async fn products_sitemap(State(state): State<AppState>) -> Result<Response> {
    let products = state.catalog().get_sitemap_products().await?;
    Ok(xml(sitemap::products_sitemap(&state.config().base_url, &products)))
}
