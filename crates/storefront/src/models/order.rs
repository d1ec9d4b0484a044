//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use impacto33_core::{CurrencyCode, OrderId, OrderItemId, OrderStatus, ProductId, UserId, VariationId};

use super::cart::Customization;

/// An order placed by a customer.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Human-facing number, e.g. `I33-2026-000123`.
    pub order_number: String,
    pub status: OrderStatus,
    pub currency: CurrencyCode,
    pub subtotal: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
    pub billing_address: Option<serde_json::Value>,
    pub shipping_address: Option<serde_json::Value>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order, a frozen copy of the cart line.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub variation_id: Option<VariationId>,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub product_image: Option<String>,
    pub variation_attributes: serde_json::Value,
    pub quantity: i32,
    pub unit_price_without_vat: Decimal,
    pub unit_price_with_vat: Decimal,
    pub total_price_without_vat: Decimal,
    pub total_price_with_vat: Decimal,
    pub customization: Option<Customization>,
    pub created_at: DateTime<Utc>,
}

/// Order row for the order history list.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order: Order,
    /// Number of lines in the order.
    pub items_count: i64,
}

/// An order with all its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
}
