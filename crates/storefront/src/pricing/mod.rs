//! Quantity-scaled pricing for personalised products.
//!
//! Every catalog product belongs to a pricing *family* (clothing, accessories,
//! home, stationery, other). A family defines a minimum order, a table of
//! quantity tiers with a scale factor each, and a cost per print zone.
//!
//! ```text
//! base          = regular_price / 2
//! personalised  = base + Σ zone_cost(zone)
//! unit_price    = personalised × factor(quantity)
//! total_net     = unit_price × quantity
//! total_gross   = total_net × 1.21
//! ```
//!
//! # Modules
//!
//! - `families` - Family tables and category → family mapping
//! - `printing` - Printing methods, per-family method config and zone overrides
//! - `selection` - Colour/size selection built from product variations

mod families;
mod printing;
mod selection;

use rust_decimal::Decimal;
use serde::Serialize;

use impacto33_core::{Price, add_vat};

pub use families::{EMERGENCY_PRICING, PricingFamily, pricing_data_for};
pub use printing::{
    FamilyPrintingConfig, PricingType, PrintingMethod, allowed_methods_for_category,
    allowed_zones_for_category, zone_label,
};
pub use selection::{
    ColorOption, PricingContext, SelectionSummary, SizeLine, SizeOption, available_colors,
    clamp_quantity, effective_stock, size_options,
};

/// Hundredths as a `Decimal`, usable in constants.
pub(crate) const fn hundredths(value: u32) -> Decimal {
    Decimal::from_parts(value, 0, 0, false, 2)
}

/// Pricing table of one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingData {
    /// Display name of the family.
    pub category_name: &'static str,
    /// Smallest order accepted for the family.
    pub min_quantity: u32,
    /// `(tier quantity, factor)` in ascending tier order.
    pub scale_factors: &'static [(u32, Decimal)],
    /// `(zone id, cost per unit)`.
    pub zone_costs: &'static [(&'static str, Decimal)],
    /// Zones offered for the family, in display order.
    pub allowed_zones: &'static [&'static str],
    pub notes: &'static str,
}

impl PricingData {
    /// Cost of one print zone; unknown zones cost nothing.
    #[must_use]
    pub fn zone_cost(&self, zone: &str) -> Decimal {
        self.zone_costs
            .iter()
            .find(|(id, _)| *id == zone)
            .map_or(Decimal::ZERO, |(_, cost)| *cost)
    }

    /// Largest tier quantity, used for the "from" price.
    #[must_use]
    pub fn highest_tier(&self) -> u32 {
        self.scale_factors
            .iter()
            .map(|(qty, _)| *qty)
            .max()
            .unwrap_or(1)
    }
}

/// Result of a price calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceCalculation {
    /// Half the regular price.
    pub base_unit_price: Decimal,
    /// Sum of the selected zone costs.
    pub personalization_price: Decimal,
    /// `(base + personalization) × factor`.
    pub unit_price: Decimal,
    pub total_without_vat: Decimal,
    pub total_with_vat: Decimal,
    pub total_quantity: u32,
    pub min_quantity: u32,
    pub meets_minimum: bool,
    pub factor: Decimal,
    pub zones: Vec<String>,
}

/// Scale factor for a quantity.
///
/// Uses the highest tier not above `quantity`. Quantities below the first tier
/// use the first tier's factor; an empty table yields `1`.
#[must_use]
pub fn escalation_multiplier(quantity: u32, factors: &[(u32, Decimal)]) -> Decimal {
    let applicable = factors
        .iter()
        .filter(|(tier, _)| *tier <= quantity)
        .max_by_key(|(tier, _)| *tier)
        .or_else(|| factors.iter().min_by_key(|(tier, _)| *tier));

    applicable.map_or(Decimal::ONE, |(_, factor)| *factor)
}

/// Price `quantity` units of a product with the given print zones.
#[must_use]
pub fn calculate_scaled_price(
    regular_price: Decimal,
    quantity: u32,
    zones: &[String],
    data: &PricingData,
) -> PriceCalculation {
    let base_unit_price = regular_price / Decimal::TWO;
    let personalization_price: Decimal = zones.iter().map(|zone| data.zone_cost(zone)).sum();
    let factor = escalation_multiplier(quantity, data.scale_factors);
    let unit_price = (base_unit_price + personalization_price) * factor;
    let total_without_vat = unit_price * Decimal::from(quantity);

    PriceCalculation {
        base_unit_price,
        personalization_price,
        unit_price,
        total_without_vat,
        total_with_vat: add_vat(total_without_vat),
        total_quantity: quantity,
        min_quantity: data.min_quantity,
        meets_minimum: quantity >= data.min_quantity,
        factor,
        zones: zones.to_vec(),
    }
}

/// Lowest unit price a product can reach (highest tier, no zones).
#[must_use]
pub fn from_price(regular_price: Decimal, data: &PricingData) -> Decimal {
    calculate_scaled_price(regular_price, data.highest_tier(), &[], data).unit_price
}

/// Format an amount as `es-ES` euros.
#[must_use]
pub fn format_euro(amount: Decimal) -> String {
    Price::eur(amount).display()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_DATA: PricingData = PricingData {
        category_name: "Test",
        min_quantity: 10,
        scale_factors: &[(10, hundredths(500)), (100, hundredths(200)), (1000, hundredths(100))],
        zone_costs: &[("frontal", hundredths(50))],
        allowed_zones: &["frontal"],
        notes: "",
    };

    #[test]
    fn test_escalation_multiplier_tiers() {
        let factors = TEST_DATA.scale_factors;
        assert_eq!(escalation_multiplier(10, factors), Decimal::from(5));
        assert_eq!(escalation_multiplier(99, factors), Decimal::from(5));
        assert_eq!(escalation_multiplier(100, factors), Decimal::from(2));
        assert_eq!(escalation_multiplier(5000, factors), Decimal::ONE);
    }

    #[test]
    fn test_escalation_multiplier_below_first_tier() {
        assert_eq!(escalation_multiplier(1, TEST_DATA.scale_factors), Decimal::from(5));
    }

    #[test]
    fn test_escalation_multiplier_empty_table() {
        assert_eq!(escalation_multiplier(50, &[]), Decimal::ONE);
    }

    #[test]
    fn test_calculate_scaled_price() {
        let calc = calculate_scaled_price(
            Decimal::from(10),
            100,
            &["frontal".to_string()],
            &TEST_DATA,
        );
        assert_eq!(calc.base_unit_price, Decimal::from(5));
        assert_eq!(calc.personalization_price, hundredths(50));
        assert_eq!(calc.unit_price, Decimal::from(11));
        assert_eq!(calc.total_without_vat, Decimal::from(1100));
        assert_eq!(calc.total_with_vat, Decimal::from(1331));
        assert!(calc.meets_minimum);
    }

    #[test]
    fn test_unknown_zone_costs_nothing() {
        let calc = calculate_scaled_price(
            Decimal::from(10),
            5,
            &["espalda".to_string()],
            &TEST_DATA,
        );
        assert_eq!(calc.personalization_price, Decimal::ZERO);
        assert!(!calc.meets_minimum);
    }

    #[test]
    fn test_from_price_uses_highest_tier() {
        assert_eq!(from_price(Decimal::from(10), &TEST_DATA), Decimal::from(5));
    }

    #[test]
    fn test_format_euro() {
        assert_eq!(format_euro(hundredths(1250)), "12,50\u{a0}€");
        assert_eq!(format_euro(Decimal::from(12345)), "12.345,00\u{a0}€");
    }
}
