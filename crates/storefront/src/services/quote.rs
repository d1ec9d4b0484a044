//! Quote requests sent from the product pricing flow.
//!
//! The browser posts the customer's contact data together with the selected
//! colour, sizes and print zones. A request is validated into a
//! [`ValidQuote`] before any email goes out.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use impacto33_core::{Email, EmailError, round_cents};

use crate::pricing::zone_label;

/// Most units accepted for one size.
pub const MAX_UNITS_PER_SIZE: i64 = 100_000;

/// Most units accepted across all sizes.
pub const MAX_TOTAL_UNITS: i64 = 1_000_000;

/// Largest amount, in euros, accepted in the `pricing` block.
pub const MAX_QUOTE_AMOUNT: i64 = 100_000_000;

/// Incoming quote request (`POST /api/quote`).
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub product: QuoteProduct,
    #[serde(default)]
    pub pricing: Option<QuotePricing>,
}

/// Product selection inside a quote request.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteProduct {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub selected_color: Option<String>,
    /// Size → units.
    #[serde(default)]
    pub quantities: BTreeMap<String, i64>,
    #[serde(default)]
    pub selected_zones: Vec<String>,
}

/// Price shown to the customer when the request was made.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QuotePricing {
    pub unit_price: f64,
    pub total_without_vat: f64,
    pub total_with_vat: f64,
    pub total_quantity: i64,
}

/// Errors rejecting a quote request.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("El nombre es obligatorio")]
    MissingName,

    #[error("Email inválido: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Indica al menos una unidad")]
    EmptyQuantity,

    #[error("Cantidad demasiado alta: máximo 100.000 unidades por talla y 1.000.000 en total")]
    QuantityTooLarge,

    #[error("Importe de presupuesto no válido")]
    InvalidAmount,
}

/// One size line of a validated quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteLine {
    pub size: String,
    pub quantity: i64,
    /// `quantity × unit price`, when a price was supplied.
    pub subtotal: Option<Decimal>,
}

/// Amounts of a validated quote, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteAmounts {
    pub unit_price: Decimal,
    pub total_without_vat: Decimal,
    pub vat_amount: Decimal,
    pub total_with_vat: Decimal,
}

/// A quote request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidQuote {
    pub name: String,
    pub email: Email,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub product_id: String,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub product_image: Option<String>,
    pub color: Option<String>,
    /// Zone labels, e.g. `Frontal`.
    pub zones: Vec<String>,
    pub lines: Vec<QuoteLine>,
    pub total_quantity: i64,
    pub amounts: Option<QuoteAmounts>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Finite, non-negative and below [`MAX_QUOTE_AMOUNT`], rounded to cents.
fn to_cents(value: f64) -> Result<Decimal, QuoteError> {
    if !value.is_finite() || value < 0.0 {
        return Err(QuoteError::InvalidAmount);
    }
    let amount = Decimal::try_from(value).map_err(|_| QuoteError::InvalidAmount)?;
    if amount > Decimal::from(MAX_QUOTE_AMOUNT) {
        return Err(QuoteError::InvalidAmount);
    }
    Ok(round_cents(amount))
}

impl QuoteRequest {
    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError` when the name is blank, the email is invalid, no
    /// size has a positive quantity, a quantity is above the caps or an amount
    /// is negative, non-finite or too large.
    pub fn validate(self) -> Result<ValidQuote, QuoteError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(QuoteError::MissingName);
        }
        let email = Email::parse(&self.email)?;

        let amounts = self
            .pricing
            .map(|p| -> Result<QuoteAmounts, QuoteError> {
                let total_without_vat = to_cents(p.total_without_vat)?;
                let total_with_vat = to_cents(p.total_with_vat)?;
                Ok(QuoteAmounts {
                    unit_price: to_cents(p.unit_price)?,
                    total_without_vat,
                    vat_amount: total_with_vat - total_without_vat,
                    total_with_vat,
                })
            })
            .transpose()?;

        let mut lines = Vec::new();
        let mut total_quantity: i64 = 0;
        for (size, quantity) in self.product.quantities {
            if quantity <= 0 {
                continue;
            }
            if quantity > MAX_UNITS_PER_SIZE {
                return Err(QuoteError::QuantityTooLarge);
            }
            total_quantity = total_quantity
                .checked_add(quantity)
                .filter(|total| *total <= MAX_TOTAL_UNITS)
                .ok_or(QuoteError::QuantityTooLarge)?;

            let subtotal = amounts
                .map(|a| {
                    a.unit_price
                        .checked_mul(Decimal::from(quantity))
                        .ok_or(QuoteError::InvalidAmount)
                })
                .transpose()?;
            lines.push(QuoteLine {
                size,
                quantity,
                subtotal,
            });
        }

        if total_quantity <= 0 {
            return Err(QuoteError::EmptyQuantity);
        }

        Ok(ValidQuote {
            name,
            email,
            company: non_empty(self.company),
            phone: non_empty(self.phone),
            message: non_empty(self.message),
            product_id: self.product.id,
            product_name: self.product.name,
            product_sku: non_empty(self.product.sku),
            product_image: non_empty(self.product.image),
            color: non_empty(self.product.selected_color),
            zones: self
                .product
                .selected_zones
                .iter()
                .map(|z| zone_label(z).to_string())
                .collect(),
            lines,
            total_quantity,
            amounts,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> QuoteRequest {
        serde_json::from_value(serde_json::json!({
            "name": "  Ana  ",
            "email": "ana@example.com",
            "company": "",
            "product": {
                "id": "123",
                "name": "Camiseta",
                "selected_color": "rojo",
                "quantities": { "M": 30, "L": 0, "XL": 20 },
                "selected_zones": ["frontal", "espalda"]
            },
            "pricing": {
                "unit_price": 12.7305,
                "total_without_vat": 636.525,
                "total_with_vat": 770.19525,
                "total_quantity": 50
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_quote() {
        let quote = request().validate().unwrap();
        assert_eq!(quote.name, "Ana");
        assert_eq!(quote.company, None);
        assert_eq!(quote.total_quantity, 50);
        assert_eq!(quote.lines.len(), 2);
        assert_eq!(quote.zones, vec!["Frontal", "Espalda"]);

        let amounts = quote.amounts.unwrap();
        assert_eq!(amounts.unit_price, Decimal::new(1273, 2));
        assert_eq!(amounts.total_with_vat, Decimal::new(77_020, 2));
        assert_eq!(quote.lines[0].subtotal, Some(Decimal::new(25_460, 2)));
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut req = request();
        req.name = "   ".to_string();
        assert!(matches!(req.validate(), Err(QuoteError::MissingName)));
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut req = request();
        req.email = "not-an-email".to_string();
        assert!(matches!(req.validate(), Err(QuoteError::InvalidEmail(_))));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut req = request();
        req.product.quantities = BTreeMap::from([("M".to_string(), 0)]);
        assert!(matches!(req.validate(), Err(QuoteError::EmptyQuantity)));
    }

    #[test]
    fn test_pricing_is_optional() {
        let mut req = request();
        req.pricing = None;
        let quote = req.validate().unwrap();
        assert!(quote.amounts.is_none());
        assert!(quote.lines.iter().all(|l| l.subtotal.is_none()));
    }

    #[test]
    fn test_huge_quantities_rejected() {
        let mut req = request();
        req.product.quantities = BTreeMap::from([("M".to_string(), 1_000_000_000_000_000_000)]);
        assert!(matches!(req.validate(), Err(QuoteError::QuantityTooLarge)));

        // Each size below the cap, but the sum above it
        let mut req = request();
        req.product.quantities = (0..11)
            .map(|i| (format!("T{i}"), MAX_UNITS_PER_SIZE))
            .collect();
        assert!(matches!(req.validate(), Err(QuoteError::QuantityTooLarge)));
    }

    #[test]
    fn test_out_of_range_amounts_rejected() {
        let mut req = request();
        req.pricing.as_mut().unwrap().unit_price = 1e20;
        req.product.quantities = BTreeMap::from([("M".to_string(), MAX_UNITS_PER_SIZE)]);
        assert!(matches!(req.validate(), Err(QuoteError::InvalidAmount)));

        let mut req = request();
        req.pricing.as_mut().unwrap().total_with_vat = f64::NAN;
        assert!(matches!(req.validate(), Err(QuoteError::InvalidAmount)));

        let mut req = request();
        req.pricing.as_mut().unwrap().unit_price = -1.0;
        assert!(matches!(req.validate(), Err(QuoteError::InvalidAmount)));
    }

    #[test]
    fn test_largest_accepted_quote() {
        let mut req = request();
        req.pricing.as_mut().unwrap().unit_price = 100_000_000.0;
        req.product.quantities = BTreeMap::from([("M".to_string(), MAX_UNITS_PER_SIZE)]);
        let quote = req.validate().unwrap();
        assert_eq!(
            quote.lines[0].subtotal,
            Some(Decimal::from(MAX_QUOTE_AMOUNT) * Decimal::from(MAX_UNITS_PER_SIZE))
        );
    }
}
