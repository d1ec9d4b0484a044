//! Cart repository.
//!
//! Every item operation is scoped to the caller's `active` cart, so a user can
//! never touch another user's lines by guessing an item id.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use impacto33_core::{CartId, CartItemId, CartStatus, CurrencyCode, ProductId, UserId, VariationId};

use super::{RepositoryError, parse_currency, parse_customization};
use crate::models::{Cart, CartItem, CartTotals, CartWithItems, LinePrices, NewCartItem};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    status: CartStatus,
    currency: String,
    subtotal: Decimal,
    vat_amount: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            currency: parse_currency(&row.currency)?,
            subtotal: row.subtotal,
            vat_amount: row.vat_amount,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    cart_id: CartId,
    product_id: ProductId,
    variation_id: Option<VariationId>,
    product_name: String,
    product_sku: Option<String>,
    product_image: Option<String>,
    variation_attributes: serde_json::Value,
    quantity: i32,
    unit_price_without_vat: Decimal,
    unit_price_with_vat: Decimal,
    total_price_without_vat: Decimal,
    total_price_with_vat: Decimal,
    customization: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            cart_id: row.cart_id,
            product_id: row.product_id,
            variation_id: row.variation_id,
            product_name: row.product_name,
            product_sku: row.product_sku,
            product_image: row.product_image,
            variation_attributes: row.variation_attributes,
            quantity: row.quantity,
            unit_price_without_vat: row.unit_price_without_vat,
            unit_price_with_vat: row.unit_price_with_vat,
            total_price_without_vat: row.total_price_without_vat,
            total_price_with_vat: row.total_price_with_vat,
            customization: parse_customization(row.customization)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Shared helpers (usable inside transactions)
// =============================================================================

/// Most recent active cart of a user, creating one when none exists.
pub(super) async fn active_cart(
    conn: &mut PgConnection,
    user_id: UserId,
    currency: CurrencyCode,
) -> Result<Cart, RepositoryError> {
    let existing = sqlx::query_as::<_, CartRow>(
        r"
        SELECT id, user_id, status, currency, subtotal, vat_amount, total, created_at, updated_at
        FROM public.carts
        WHERE user_id = $1 AND status = 'active'
        ORDER BY created_at DESC
        LIMIT 1
        ",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = existing {
        return row.try_into();
    }

    // A concurrent request may have created the cart in between; the partial
    // unique index turns that into a no-op and the select below finds it.
    sqlx::query(
        r"
        INSERT INTO public.carts (user_id, status, currency)
        VALUES ($1, 'active', $2)
        ON CONFLICT (user_id) WHERE status = 'active' DO NOTHING
        ",
    )
    .bind(user_id)
    .bind(currency.code())
    .execute(&mut *conn)
    .await?;

    sqlx::query_as::<_, CartRow>(
        r"
        SELECT id, user_id, status, currency, subtotal, vat_amount, total, created_at, updated_at
        FROM public.carts
        WHERE user_id = $1 AND status = 'active'
        ORDER BY created_at DESC
        LIMIT 1
        ",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?
    .try_into()
}

/// Recompute and store the cart totals from its lines.
pub(super) async fn recalculate_totals(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<CartTotals, RepositoryError> {
    let (net, gross): (Decimal, Decimal) = sqlx::query_as(
        r"
        SELECT COALESCE(SUM(total_price_without_vat), 0),
               COALESCE(SUM(total_price_with_vat), 0)
        FROM public.cart_items
        WHERE cart_id = $1
        ",
    )
    .bind(cart_id)
    .fetch_one(&mut *conn)
    .await?;

    let totals = CartTotals::from_lines([(net, gross)]);
    store_totals(conn, cart_id, totals).await?;
    Ok(totals)
}

/// Insert a line, or add to the quantity of the line with the same
/// product and variation.
async fn upsert_line(conn: &mut PgConnection, cart_id: CartId, input: &NewCartItem) -> Result<(), RepositoryError> {
    let existing: Option<(CartItemId, i32, Decimal, Decimal)> = sqlx::query_as(
        r"
        SELECT id, quantity, unit_price_without_vat, unit_price_with_vat
        FROM public.cart_items
        WHERE cart_id = $1 AND product_id = $2 AND variation_id IS NOT DISTINCT FROM $3
        LIMIT 1
        ",
    )
    .bind(cart_id)
    .bind(input.product_id)
    .bind(input.variation_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some((item_id, quantity, unit_net, unit_gross)) = existing {
        let quantity = quantity
            .checked_add(input.quantity)
            .ok_or_else(|| RepositoryError::Invalid("quantity too large".to_string()))?;
        let prices = LinePrices::from_units(unit_net, unit_gross, quantity);
        sqlx::query(
            r"
            UPDATE public.cart_items
            SET quantity = $2, total_price_without_vat = $3, total_price_with_vat = $4,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(item_id)
        .bind(quantity)
        .bind(prices.total_without_vat)
        .bind(prices.total_with_vat)
        .execute(&mut *conn)
        .await?;
        return Ok(());
    }

    let prices = LinePrices::from_gross_unit(input.unit_price_with_vat, input.quantity);
    let customization = input
        .customization
        .as_ref()
        .filter(|c| !c.is_empty())
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| RepositoryError::Invalid(format!("invalid customization: {e}")))?;

    sqlx::query(
        r"
        INSERT INTO public.cart_items (
            cart_id, product_id, variation_id, product_name, product_sku, product_image,
            variation_attributes, quantity, unit_price_without_vat, unit_price_with_vat,
            total_price_without_vat, total_price_with_vat, customization
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ",
    )
    .bind(cart_id)
    .bind(input.product_id)
    .bind(input.variation_id)
    .bind(&input.product_name)
    .bind(&input.product_sku)
    .bind(&input.product_image)
    .bind(&input.variation_attributes)
    .bind(input.quantity)
    .bind(prices.unit_without_vat)
    .bind(prices.unit_with_vat)
    .bind(prices.total_without_vat)
    .bind(prices.total_with_vat)
    .bind(customization)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(super) async fn store_totals(
    conn: &mut PgConnection,
    cart_id: CartId,
    totals: CartTotals,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE public.carts
        SET subtotal = $2, vat_amount = $3, total = $4, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(cart_id)
    .bind(totals.subtotal)
    .bind(totals.vat_amount)
    .bind(totals.total)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's active cart, creating an empty one if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create_active_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        active_cart(&mut conn, user_id, CurrencyCode::EUR).await
    }

    /// Get a cart and its lines, newest lines first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart does not exist.
    pub async fn get_cart_with_items(&self, cart_id: CartId) -> Result<CartWithItems, RepositoryError> {
        let cart: Cart = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, status, currency, subtotal, vat_amount, total, created_at, updated_at
            FROM public.carts
            WHERE id = $1
            ",
        )
        .bind(cart_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()?;

        let items = self.items(cart_id).await?;
        Ok(CartWithItems { cart, items })
    }

    /// The user's active cart with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_active_cart_with_items(&self, user_id: UserId) -> Result<CartWithItems, RepositoryError> {
        let cart = self.get_or_create_active_cart(user_id).await?;
        self.get_cart_with_items(cart.id).await
    }

    async fn items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, cart_id, product_id, variation_id, product_name, product_sku, product_image,
                   variation_attributes, quantity, unit_price_without_vat, unit_price_with_vat,
                   total_price_without_vat, total_price_with_vat, customization,
                   created_at, updated_at
            FROM public.cart_items
            WHERE cart_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Add a product to the active cart.
    ///
    /// The net unit price is derived from the VAT-inclusive one. Adding the
    /// same product/variation again increases the existing line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the quantity is below 1 or the
    /// product id is not positive.
    pub async fn add_item(&self, user_id: UserId, input: &NewCartItem) -> Result<CartTotals, RepositoryError> {
        self.add_items(user_id, std::slice::from_ref(input)).await
    }

    /// Add several lines (one per size) in a single transaction: either all
    /// of them land in the cart or none do.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if `inputs` is empty or any line is
    /// invalid; nothing is written in that case.
    pub async fn add_items(&self, user_id: UserId, inputs: &[NewCartItem]) -> Result<CartTotals, RepositoryError> {
        if inputs.is_empty() {
            return Err(RepositoryError::Invalid("no items to add".to_string()));
        }
        for input in inputs {
            if input.quantity < 1 {
                return Err(RepositoryError::Invalid("quantity must be at least 1".to_string()));
            }
            if !input.product_id.is_valid() {
                return Err(RepositoryError::Invalid("invalid product id".to_string()));
            }
        }

        let mut tx = self.pool.begin().await?;
        let cart = active_cart(&mut tx, user_id, CurrencyCode::EUR).await?;
        for input in inputs {
            upsert_line(&mut tx, cart.id, input).await?;
        }
        let totals = recalculate_totals(&mut tx, cart.id).await?;
        tx.commit().await?;
        Ok(totals)
    }

    /// Set the quantity of a line in the active cart. Zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in the user's active cart.
    pub async fn update_item_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartTotals, RepositoryError> {
        if quantity <= 0 {
            return self.remove_item(user_id, item_id).await;
        }

        let mut tx = self.pool.begin().await?;

        let line: Option<(CartId, Decimal, Decimal)> = sqlx::query_as(
            r"
            SELECT ci.cart_id, ci.unit_price_without_vat, ci.unit_price_with_vat
            FROM public.cart_items ci
            JOIN public.carts c ON c.id = ci.cart_id
            WHERE ci.id = $1 AND c.user_id = $2 AND c.status = 'active'
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (cart_id, unit_net, unit_gross) = line.ok_or(RepositoryError::NotFound)?;
        let prices = LinePrices::from_units(unit_net, unit_gross, quantity);

        sqlx::query(
            r"
            UPDATE public.cart_items
            SET quantity = $2, total_price_without_vat = $3, total_price_with_vat = $4,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(item_id)
        .bind(quantity)
        .bind(prices.total_without_vat)
        .bind(prices.total_with_vat)
        .execute(&mut *tx)
        .await?;

        let totals = recalculate_totals(&mut tx, cart_id).await?;
        tx.commit().await?;
        Ok(totals)
    }

    /// Remove a line from the active cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in the user's active cart.
    pub async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> Result<CartTotals, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let cart_id: Option<CartId> = sqlx::query_scalar(
            r"
            DELETE FROM public.cart_items ci
            USING public.carts c
            WHERE ci.id = $1 AND c.id = ci.cart_id AND c.user_id = $2 AND c.status = 'active'
            RETURNING ci.cart_id
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let cart_id = cart_id.ok_or(RepositoryError::NotFound)?;
        let totals = recalculate_totals(&mut tx, cart_id).await?;
        tx.commit().await?;
        Ok(totals)
    }

    /// Remove every line from the active cart and zero its totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn clear_cart(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let cart = active_cart(&mut tx, user_id, CurrencyCode::EUR).await?;

        sqlx::query("DELETE FROM public.cart_items WHERE cart_id = $1")
            .bind(cart.id)
            .execute(&mut *tx)
            .await?;
        store_totals(&mut tx, cart.id, CartTotals::default()).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Number of units in the active cart (badge count).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM(ci.quantity), 0)::BIGINT
            FROM public.cart_items ci
            JOIN public.carts c ON c.id = ci.cart_id
            WHERE c.user_id = $1 AND c.status = 'active'
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }
}
