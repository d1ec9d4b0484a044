//! Wishlist repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use impacto33_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::WishlistItem;

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    user_id: UserId,
    product_id: ProductId,
    created_at: DateTime<Utc>,
}

impl From<WishlistRow> for WishlistItem {
    fn from(row: WishlistRow) -> Self {
        Self {
            user_id: row.user_id,
            product_id: row.product_id,
            created_at: row.created_at,
        }
    }
}

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Saved products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId, limit: Option<i64>) -> Result<Vec<WishlistItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistRow>(
            r"
            SELECT user_id, product_id, created_at
            FROM public.wishlist
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

    /// Product ids in the wishlist, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_ids(&self, user_id: UserId, limit: Option<i64>) -> Result<Vec<ProductId>, RepositoryError> {
        Ok(self
            .list(user_id, limit)
            .await?
            .into_iter()
            .map(|item| item.product_id)
            .collect())
    }

    /// Whether a product is saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_in_wishlist(&self, user_id: UserId, product_id: ProductId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM public.wishlist WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Save a product. Saving it twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` for a non-positive product id.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        if !product_id.is_valid() {
            return Err(RepositoryError::Invalid("invalid product id".to_string()));
        }

        sqlx::query(
            r"
            INSERT INTO public.wishlist (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Remove a product. Returns whether it was saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM public.wishlist WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add the product if missing, remove it otherwise. Returns `true` when added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` for a non-positive product id.
    pub async fn toggle(&self, user_id: UserId, product_id: ProductId) -> Result<bool, RepositoryError> {
        if !product_id.is_valid() {
            return Err(RepositoryError::Invalid("invalid product id".to_string()));
        }

        if self.remove(user_id, product_id).await? {
            Ok(false)
        } else {
            self.add(user_id, product_id).await?;
            Ok(true)
        }
    }

    /// Empty the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM public.wishlist WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
