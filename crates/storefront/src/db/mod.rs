//! Database operations for the storefront `PostgreSQL` (Supabase).
//!
//! WooCommerce owns the catalog; this database only holds per-customer data.
//!
//! ## Tables
//!
//! - `user_personalization` - Profile, newsletter consent and onboarding answers
//! - `carts` / `cart_items` - Shopping carts (one `active` cart per user)
//! - `orders` / `order_items` - Order history
//! - `wishlist` - Saved products
//! - `search_history` - Recent searches
//! - `viewed_products` - Recently viewed products
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p impacto33-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod activity;
pub mod carts;
pub mod orders;
pub mod profiles;
pub mod wishlist;

pub use activity::{
    RECENT_SEARCHES_LIMIT, RECENT_VIEWED_LIMIT, SearchHistoryRepository, ViewedProductRepository,
};
pub use carts::CartRepository;
pub use orders::{DEFAULT_ORDER_LIMIT, OrderRepository};
pub use profiles::ProfileRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate row).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The request cannot be applied to the current data.
    #[error("invalid operation: {0}")]
    Invalid(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Parse a currency column.
fn parse_currency(raw: &str) -> Result<impacto33_core::CurrencyCode, RepositoryError> {
    raw.parse()
        .map_err(|e: String| RepositoryError::DataCorruption(e))
}

/// Decode an optional JSONB customization column.
fn parse_customization(
    value: Option<serde_json::Value>,
) -> Result<Option<crate::models::Customization>, RepositoryError> {
    value
        .filter(|v| !v.is_null())
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid customization: {e}")))
}
