//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use impacto33_core::{
    CartId, CartItemId, CartStatus, CurrencyCode, ProductId, UserId, VariationId, remove_vat,
    round_cents,
};

/// A shopping cart with its stored totals.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub status: CartStatus,
    pub currency: CurrencyCode,
    /// Sum of line totals without VAT.
    pub subtotal: Decimal,
    pub vat_amount: Decimal,
    /// Sum of line totals with VAT.
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Personalisation chosen for a cart line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    /// Print zones, e.g. `frontal`, `espalda`.
    #[serde(default)]
    pub zones: Vec<String>,
    pub printing_method: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
}

impl Customization {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
            && self.printing_method.is_none()
            && self.color.is_none()
            && self.notes.is_none()
    }
}

/// One line of a cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub variation_id: Option<VariationId>,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub product_image: Option<String>,
    /// Attribute name → value, e.g. `{"pa_color": "rojo", "pa_size": "M"}`.
    pub variation_attributes: serde_json::Value,
    pub quantity: i32,
    pub unit_price_without_vat: Decimal,
    pub unit_price_with_vat: Decimal,
    pub total_price_without_vat: Decimal,
    pub total_price_with_vat: Decimal,
    pub customization: Option<Customization>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    /// Human readable variation summary, e.g. `rojo / M`.
    #[must_use]
    pub fn variation_label(&self) -> String {
        self.variation_attributes
            .as_object()
            .map(|attrs| {
                attrs
                    .values()
                    .filter_map(serde_json::Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" / ")
            })
            .unwrap_or_default()
    }
}

/// Input for adding a product to the cart.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub variation_id: Option<VariationId>,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub product_image: Option<String>,
    pub variation_attributes: serde_json::Value,
    pub quantity: i32,
    /// Unit price as shown to the customer (VAT included).
    pub unit_price_with_vat: Decimal,
    pub customization: Option<Customization>,
}

/// Unit and line prices for a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePrices {
    pub unit_without_vat: Decimal,
    pub unit_with_vat: Decimal,
    pub total_without_vat: Decimal,
    pub total_with_vat: Decimal,
}

impl LinePrices {
    /// Prices for `quantity` units of a VAT-inclusive unit price.
    #[must_use]
    pub fn from_gross_unit(unit_with_vat: Decimal, quantity: i32) -> Self {
        let unit_without_vat = round_cents(remove_vat(unit_with_vat));
        Self::from_units(unit_without_vat, unit_with_vat, quantity)
    }

    /// Prices for `quantity` units of already split unit prices.
    #[must_use]
    pub fn from_units(unit_without_vat: Decimal, unit_with_vat: Decimal, quantity: i32) -> Self {
        let qty = Decimal::from(quantity);
        Self {
            unit_without_vat,
            unit_with_vat,
            total_without_vat: unit_without_vat * qty,
            total_with_vat: unit_with_vat * qty,
        }
    }
}

/// Stored cart totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    /// Totals from line totals `(without_vat, with_vat)`.
    pub fn from_lines(lines: impl IntoIterator<Item = (Decimal, Decimal)>) -> Self {
        let (subtotal, total) = lines
            .into_iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(net, gross), (n, g)| {
                (net + n, gross + g)
            });
        Self {
            subtotal,
            vat_amount: total - subtotal,
            total,
        }
    }
}

/// A cart together with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct CartWithItems {
    pub cart: Cart,
    pub items: Vec<CartItem>,
}

impl CartWithItems {
    /// Number of units in the cart (badge count).
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.quantity)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_prices_from_gross_unit() {
        // 12,10 € with VAT → 10,00 € net
        let prices = LinePrices::from_gross_unit(Decimal::new(1210, 2), 3);
        assert_eq!(prices.unit_without_vat, Decimal::new(1000, 2));
        assert_eq!(prices.total_without_vat, Decimal::new(3000, 2));
        assert_eq!(prices.total_with_vat, Decimal::new(3630, 2));
    }

    #[test]
    fn test_line_prices_round_net_unit() {
        // 5,00 / 1,21 = 4,1322… → 4,13
        let prices = LinePrices::from_gross_unit(Decimal::new(500, 2), 2);
        assert_eq!(prices.unit_without_vat, Decimal::new(413, 2));
        assert_eq!(prices.total_without_vat, Decimal::new(826, 2));
        assert_eq!(prices.total_with_vat, Decimal::new(1000, 2));
    }

    #[test]
    fn test_totals_from_lines() {
        let totals = CartTotals::from_lines([
            (Decimal::new(3000, 2), Decimal::new(3630, 2)),
            (Decimal::new(826, 2), Decimal::new(1000, 2)),
        ]);
        assert_eq!(totals.subtotal, Decimal::new(3826, 2));
        assert_eq!(totals.total, Decimal::new(4630, 2));
        assert_eq!(totals.vat_amount, Decimal::new(804, 2));
    }

    #[test]
    fn test_totals_empty_cart() {
        assert_eq!(CartTotals::from_lines([]), CartTotals::default());
    }

    #[test]
    fn test_customization_is_empty() {
        assert!(Customization::default().is_empty());
        let custom = Customization {
            zones: vec!["frontal".to_string()],
            ..Customization::default()
        };
        assert!(!custom.is_empty());
    }
}
