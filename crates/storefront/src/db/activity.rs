//! Search history and recently viewed products.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use impacto33_core::{ProductId, SearchHistoryId, UserId};

use super::RepositoryError;
use crate::models::activity::normalize_search_query;
use crate::models::{SearchHistoryEntry, ViewedProduct};

/// Searches shown under the search box.
pub const RECENT_SEARCHES_LIMIT: i64 = 5;

/// Products shown in "recently viewed".
pub const RECENT_VIEWED_LIMIT: i64 = 8;

/// An identical query inside this window is not stored again.
const SEARCH_DEDUPE_MINUTES: i32 = 5;

// =============================================================================
// Search history
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SearchHistoryRow {
    id: SearchHistoryId,
    user_id: UserId,
    query: String,
    created_at: DateTime<Utc>,
}

impl From<SearchHistoryRow> for SearchHistoryEntry {
    fn from(row: SearchHistoryRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            query: row.query,
            created_at: row.created_at,
        }
    }
}

/// Repository for the per-user search history.
pub struct SearchHistoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SearchHistoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a search. Returns `false` when nothing was stored (blank query
    /// or the same query was stored in the last few minutes).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn track(&self, user_id: UserId, raw_query: &str) -> Result<bool, RepositoryError> {
        let Some(query) = normalize_search_query(raw_query) else {
            return Ok(false);
        };

        let result = sqlx::query(
            r"
            INSERT INTO public.search_history (user_id, query)
            SELECT $1, $2
            WHERE NOT EXISTS (
                SELECT 1 FROM public.search_history
                WHERE user_id = $1 AND query = $2
                  AND created_at > NOW() - make_interval(mins => $3)
            )
            ",
        )
        .bind(user_id)
        .bind(&query)
        .bind(SEARCH_DEDUPE_MINUTES)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Latest searches, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, user_id: UserId, limit: i64) -> Result<Vec<SearchHistoryEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, SearchHistoryRow>(
            r"
            SELECT id, user_id, query, created_at
            FROM public.search_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Delete one entry owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the entry is not the user's.
    pub async fn delete(&self, user_id: UserId, id: SearchHistoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM public.search_history WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete the whole history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM public.search_history WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Viewed products
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ViewedProductRow {
    user_id: UserId,
    product_id: ProductId,
    viewed_at: DateTime<Utc>,
}

impl From<ViewedProductRow> for ViewedProduct {
    fn from(row: ViewedProductRow) -> Self {
        Self {
            user_id: row.user_id,
            product_id: row.product_id,
            viewed_at: row.viewed_at,
        }
    }
}

/// Repository for recently viewed products.
pub struct ViewedProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ViewedProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a product view; viewing again refreshes `viewed_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` for a non-positive product id.
    pub async fn track(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        if !product_id.is_valid() {
            return Err(RepositoryError::Invalid("invalid product id".to_string()));
        }

        sqlx::query(
            r"
            INSERT INTO public.viewed_products (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO UPDATE SET viewed_at = NOW()
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Latest viewed products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, user_id: UserId, limit: i64) -> Result<Vec<ViewedProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, ViewedProductRow>(
            r"
            SELECT user_id, product_id, viewed_at
            FROM public.viewed_products
            WHERE user_id = $1
            ORDER BY viewed_at DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Forget every viewed product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM public.viewed_products WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
