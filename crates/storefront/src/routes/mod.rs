//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Landing page
//! GET  /inicio                    - Home (featured products, categories)
//!
//! # Catalog
//! GET  /producto/{slug}           - Product detail with pricing flow
//! POST /producto/{slug}/precio    - Price summary fragment (HTMX)
//! GET  /buscar                    - Product search
//! GET  /buscar/historial          - Recent searches fragment (HTMX)
//! POST /buscar/historial/{id}/delete
//! POST /buscar/historial/clear
//! GET  /{cat}/[{sub}/[{child}/]]  - SEO category pages (router fallback)
//!
//! # Cart (auth, HTMX fragments)
//! GET  /carrito                   - Cart page
//! POST /carrito/add               - Add a priced selection (triggers cart-updated)
//! POST /carrito/update            - Update quantity (returns cart_items fragment)
//! POST /carrito/remove            - Remove item (returns cart_items fragment)
//! POST /carrito/clear             - Empty the cart
//! GET  /carrito/count             - Cart count badge (fragment)
//! GET  /checkout                  - Checkout placeholder
//!
//! # Auth
//! GET  /auth/login                POST /auth/login
//! GET  /auth/register             POST /auth/register
//! GET  /auth/forgot-password      POST /auth/forgot-password
//! GET  /auth/reset-password       POST /auth/reset-password
//! GET  /auth/confirm              - Email link verification (token_hash)
//! POST /auth/resend-confirmation
//! POST /auth/logout
//!
//! # Account (auth)
//! GET  /mi-cuenta                 - Dashboard
//! GET  /mi-perfil                 POST /mi-perfil
//! POST /mi-perfil/password
//! GET  /mi-perfil/onboarding      POST /mi-perfil/onboarding
//! POST /mi-perfil/onboarding/skip
//! GET  /mis-pedidos               - Order history
//! GET  /mis-pedidos/{id}          - Order detail
//! POST /mis-pedidos/{id}/repetir  - Copy an order into the cart
//! GET  /mis-favoritos             POST /mis-favoritos/clear
//! POST /api/wishlist/toggle
//!
//! # Content
//! GET  /servicios/{slug}          - Service pages
//! GET  /contacto, /aviso-legal... - Info pages
//! GET  /presupuesto-rapido        POST /api/quote
//!
//! # Feeds
//! GET  /feeds/google.xml          POST /feeds/google.xml/clear-cache
//! GET  /feeds/google.xml/stats
//! GET  /sitemap.xml, /sitemap-pages.xml, /sitemap-products.xml
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod feeds;
pub mod form;
pub mod home;
pub mod layout;
pub mod orders;
pub mod pages;
pub mod products;
pub mod quote;
pub mod search;
pub mod views;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter, quote_rate_limiter};
use crate::state::AppState;

/// Auth pages. Only the POSTs are rate limited.
pub fn auth_routes() -> Router<AppState> {
    let limit = auth_rate_limiter();

    Router::new()
        .route(
            "/auth/login",
            get(auth::login_page).merge(post(auth::login).layer(limit.clone())),
        )
        .route(
            "/auth/register",
            get(auth::register_page).merge(post(auth::register).layer(limit.clone())),
        )
        .route(
            "/auth/forgot-password",
            get(auth::forgot_password_page).merge(post(auth::forgot_password).layer(limit.clone())),
        )
        .route(
            "/auth/reset-password",
            get(auth::reset_password_page).merge(post(auth::reset_password).layer(limit.clone())),
        )
        .route("/auth/confirm", get(auth::confirm))
        .route(
            "/auth/resend-confirmation",
            post(auth::resend_confirmation).layer(limit),
        )
        .route("/auth/logout", post(auth::logout))
}

/// Account pages.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/mi-cuenta", get(account::index))
        .route("/mi-perfil", get(account::profile).post(account::update_profile))
        .route("/mi-perfil/password", post(account::change_password))
        .route(
            "/mi-perfil/onboarding",
            get(account::onboarding_page).post(account::save_onboarding),
        )
        .route("/mi-perfil/onboarding/skip", post(account::skip_onboarding))
        .route("/mis-pedidos", get(orders::index))
        .route("/mis-pedidos/{id}", get(orders::show))
        .route("/mis-pedidos/{id}/repetir", post(orders::repeat))
        .route("/mis-favoritos", get(wishlist::index))
        .route("/mis-favoritos/clear", post(wishlist::clear))
}

/// HTMX fragment and JSON endpoints, under the general API limit.
pub fn fragment_routes() -> Router<AppState> {
    Router::new()
        .route("/carrito/add", post(cart::add))
        .route("/carrito/update", post(cart::update))
        .route("/carrito/remove", post(cart::remove))
        .route("/carrito/clear", post(cart::clear))
        .route("/carrito/count", get(cart::count))
        .route("/producto/{slug}/precio", post(products::price))
        .route("/api/wishlist/toggle", post(wishlist::toggle))
        .route("/buscar/historial", get(search::history))
        .route("/buscar/historial/{id}/delete", post(search::delete_entry))
        .route("/buscar/historial/clear", post(search::clear_history))
        .layer(api_rate_limiter())
}

/// Merchant feed and sitemaps.
pub fn feed_routes() -> Router<AppState> {
    Router::new()
        .route("/feeds/google.xml", get(feeds::google_feed))
        .route("/feeds/google.xml/clear-cache", post(feeds::clear_cache))
        .route("/feeds/google.xml/stats", get(feeds::stats))
        .route("/sitemap.xml", get(feeds::sitemap_index))
        .route("/sitemap-pages.xml", get(feeds::pages_sitemap))
        .route("/sitemap-products.xml", get(feeds::products_sitemap))
}

/// Landing, catalog and content pages.
pub fn page_routes() -> Router<AppState> {
    let mut router = Router::new()
        .route("/", get(home::landing))
        .route("/inicio", get(home::home))
        .route("/producto/{slug}", get(products::show))
        .route("/buscar", get(search::search_page))
        .route("/carrito", get(cart::show))
        .route("/checkout", get(cart::checkout))
        .route("/servicios/{slug}", get(pages::service))
        .route("/presupuesto-rapido", get(quote::quote_page))
        .route(
            "/api/quote",
            post(quote::submit).layer(quote_rate_limiter()),
        );

    for path in pages::INFO_PAGES {
        router = router.route(path, get(pages::info_page));
    }
    router
}

/// Create all routes for the storefront.
///
/// Anything unmatched goes to the SEO category lookup, which renders the
/// 404 page for unknown paths.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(page_routes())
        .merge(auth_routes())
        .merge(account_routes())
        .merge(fragment_routes())
        .merge(feed_routes())
        .fallback(categories::category_or_not_found)
}
