//! Order history repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use impacto33_core::{CartId, OrderId, OrderItemId, OrderStatus, ProductId, UserId, VariationId};

use super::carts::{active_cart, store_totals};
use super::{RepositoryError, parse_currency, parse_customization};
use crate::models::{CartTotals, Order, OrderDetails, OrderItem, OrderSummary};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    order_number: String,
    status: OrderStatus,
    currency: String,
    subtotal: Decimal,
    vat_amount: Decimal,
    total: Decimal,
    billing_address: Option<serde_json::Value>,
    shipping_address: Option<serde_json::Value>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            order_number: row.order_number,
            status: row.status,
            currency: parse_currency(&row.currency)?,
            subtotal: row.subtotal,
            vat_amount: row.vat_amount,
            total: row.total,
            billing_address: row.billing_address,
            shipping_address: row.shipping_address,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    #[sqlx(flatten)]
    order: OrderRow,
    items_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
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
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
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
        })
    }
}

/// Default page size for the order history.
pub const DEFAULT_ORDER_LIMIT: i64 = 20;

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's orders, newest first, with their line counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId, limit: i64) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            r"
            SELECT o.id, o.user_id, o.order_number, o.status, o.currency,
                   o.subtotal, o.vat_amount, o.total, o.billing_address, o.shipping_address,
                   o.notes, o.created_at, o.updated_at,
                   (SELECT COUNT(*) FROM public.order_items oi WHERE oi.order_id = o.id) AS items_count
            FROM public.orders o
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OrderSummary {
                    order: row.order.try_into()?,
                    items_count: row.items_count,
                })
            })
            .collect()
    }

    /// One order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist or
    /// belongs to another user.
    pub async fn get_details(&self, user_id: UserId, order_id: OrderId) -> Result<OrderDetails, RepositoryError> {
        let order: Order = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, order_number, status, currency, subtotal, vat_amount, total,
                   billing_address, shipping_address, notes, created_at, updated_at
            FROM public.orders
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()?;

        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, variation_id, product_name, product_sku, product_image,
                   variation_attributes, quantity, unit_price_without_vat, unit_price_with_vat,
                   total_price_without_vat, total_price_with_vat, customization, created_at
            FROM public.order_items
            WHERE order_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<OrderItem>, _>>()?;

        Ok(OrderDetails { order, items })
    }

    /// Replace the active cart's contents with the lines of a past order.
    ///
    /// Returns the cart id and the number of copied lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order is not the user's and
    /// `RepositoryError::Invalid` if it has no lines.
    pub async fn repeat_order(&self, user_id: UserId, order_id: OrderId) -> Result<(CartId, usize), RepositoryError> {
        let details = self.get_details(user_id, order_id).await?;
        if details.items.is_empty() {
            return Err(RepositoryError::Invalid("order has no items".to_string()));
        }

        let mut tx = self.pool.begin().await?;
        let cart = active_cart(&mut tx, user_id, details.order.currency).await?;

        sqlx::query("DELETE FROM public.cart_items WHERE cart_id = $1")
            .bind(cart.id)
            .execute(&mut *tx)
            .await?;

        for item in &details.items {
            let customization = item
                .customization
                .as_ref()
                .map(serde_json::to_value)
                .transpose()
                .map_err(|e| RepositoryError::DataCorruption(format!("invalid customization: {e}")))?;

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
            .bind(cart.id)
            .bind(item.product_id)
            .bind(item.variation_id)
            .bind(&item.product_name)
            .bind(&item.product_sku)
            .bind(&item.product_image)
            .bind(&item.variation_attributes)
            .bind(item.quantity)
            .bind(item.unit_price_without_vat)
            .bind(item.unit_price_with_vat)
            .bind(item.total_price_without_vat)
            .bind(item.total_price_with_vat)
            .bind(customization)
            .execute(&mut *tx)
            .await?;
        }

        let totals = CartTotals::from_lines(
            details
                .items
                .iter()
                .map(|i| (i.total_price_without_vat, i.total_price_with_vat)),
        );
        store_totals(&mut tx, cart.id, totals).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            cart_id = %cart.id,
            items = details.items.len(),
            "Order copied into cart"
        );

        Ok((cart.id, details.items.len()))
    }
}
