//! Wishlist, search history and recently viewed products.

use chrono::{DateTime, Utc};
use serde::Serialize;

use impacto33_core::{ProductId, SearchHistoryId, UserId};

/// A product saved to the wishlist.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub created_at: DateTime<Utc>,
}

/// A past search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHistoryEntry {
    pub id: SearchHistoryId,
    pub user_id: UserId,
    /// Normalised query (trimmed, lowercase).
    pub query: String,
    pub created_at: DateTime<Utc>,
}

/// A product the user has looked at.
#[derive(Debug, Clone, Serialize)]
pub struct ViewedProduct {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub viewed_at: DateTime<Utc>,
}

/// Normalise a search query for storage; `None` when nothing is left.
#[must_use]
pub fn normalize_search_query(raw: &str) -> Option<String> {
    let query = raw.trim().to_lowercase();
    (!query.is_empty()).then_some(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_search_query() {
        assert_eq!(normalize_search_query("  Camisetas ROJAS "), Some("camisetas rojas".to_string()));
        assert_eq!(normalize_search_query("   "), None);
    }
}
