//! WooCommerce catalog access over WPGraphQL.
//!
//! # Architecture
//!
//! - Queries are plain `.graphql` documents implementing `graphql_client::GraphQLQuery`
//! - WooCommerce is the source of truth for products and categories; nothing is synced locally
//! - In-memory caching via `moka` for API responses (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use impacto33_storefront::catalog::CatalogClient;
//!
//! let catalog = CatalogClient::new(&config.woocommerce);
//!
//! let product = catalog.get_product_by_slug("camiseta-basica").await?;
//! let page = catalog
//!     .get_products_by_category("t_shirts", 12, None, PriceFilter::default())
//!     .await?;
//! ```

mod client;
pub mod types;

pub use client::{CatalogClient, PriceFilter};
pub use types::*;

use std::fmt;

use thiserror::Error;

/// Errors from the WooCommerce GraphQL API.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WPGraphQL answered with `errors`, a non-success status or no data.
    #[error("GraphQL errors: {}", join_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Seconds to wait, from `Retry-After` (1 when absent).
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl CatalogError {
    /// A single error carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
        }])
    }
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQLError {
    pub message: String,
    pub locations: Vec<GraphQLErrorLocation>,
    /// Response path, e.g. `["products", "nodes", "0"]`.
    pub path: Vec<String>,
}

/// 1-indexed position in the query document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphQLErrorLocation {
    pub line: i32,
    pub column: i32,
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(error: graphql_client::Error) -> Self {
        Self {
            message: error.message,
            locations: error
                .locations
                .unwrap_or_default()
                .into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: l.line,
                    column: l.column,
                })
                .collect(),
            path: error
                .path
                .unwrap_or_default()
                .into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(key) => key,
                    graphql_client::PathFragment::Index(index) => index.to_string(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for GraphQLError {
    /// `message path: a.0 at line l:c`, skipping the empty parts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if !self.message.is_empty() {
            parts.push(self.message.clone());
        }
        if !self.path.is_empty() {
            parts.push(format!("path: {}", self.path.join(".")));
        }
        if let Some(loc) = self.locations.first() {
            parts.push(format!("at line {}:{}", loc.line, loc.column));
        }
        f.write_str(&parts.join(" "))
    }
}

fn join_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let text = e.to_string();
            if text.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                text
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(message: &str, path: &[&str], line: Option<i32>) -> GraphQLError {
        GraphQLError {
            message: message.to_string(),
            locations: line
                .map(|line| GraphQLErrorLocation { line, column: 10 })
                .into_iter()
                .collect(),
            path: path.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_not_found_display() {
        let err = CatalogError::NotFound("producto camiseta-basica".to_string());
        assert_eq!(err.to_string(), "Not found: producto camiseta-basica");
    }

    #[test]
    fn test_errors_joined_with_semicolons() {
        let err = CatalogError::GraphQL(vec![
            error("Cannot query field \"sku\" on type \"Product\"", &[], None),
            error("Invalid ID", &[], None),
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Cannot query field \"sku\" on type \"Product\"; Invalid ID"
        );
    }

    #[test]
    fn test_path_and_location() {
        let err = CatalogError::GraphQL(vec![error(
            "Internal server error",
            &["productCategories", "0"],
            Some(5),
        )]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Internal server error path: productCategories.0 at line 5:10"
        );
    }

    #[test]
    fn test_entries_without_details() {
        let err = CatalogError::GraphQL(vec![error("", &[], None)]);
        assert_eq!(err.to_string(), "GraphQL errors: [error 1]: (no details)");

        let err = CatalogError::GraphQL(vec![]);
        assert_eq!(err.to_string(), "GraphQL errors: (no error details provided)");
    }

    #[test]
    fn test_message_constructor() {
        let err = CatalogError::message("No data in response");
        assert_eq!(err.to_string(), "GraphQL errors: No data in response");
    }

    #[test]
    fn test_rate_limited_display() {
        assert_eq!(
            CatalogError::RateLimited(60).to_string(),
            "Rate limited, retry after 60 seconds"
        );
    }
}
