//! Colour and size selection for the product pricing flow.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use impacto33_core::VariationId;

use super::{
    PriceCalculation, PricingData, PricingFamily, PrintingMethod, allowed_methods_for_category,
    allowed_zones_for_category, calculate_scaled_price,
};
use crate::catalog::{Product, ProductVariation, StockStatus};

/// Stock assumed for an in-stock variation that does not track quantity.
const UNTRACKED_STOCK: i64 = 9999;

/// Stock assumed for colours only known from the product attributes.
const ATTRIBUTE_ONLY_STOCK: i64 = 999;

const COLOR_ATTRIBUTE: &str = "pa_color";
const SIZE_ATTRIBUTES: &[&str] = &["pa_size", "pa_talla"];
const DEFAULT_SIZE: &str = "Única";

/// A colour the customer can pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorOption {
    pub name: String,
    pub image: Option<String>,
    pub stock_status: StockStatus,
    pub stock_quantity: i64,
}

/// A size of the selected colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeOption {
    pub size: String,
    pub stock_status: StockStatus,
    pub stock_quantity: i64,
    pub price: Option<Decimal>,
    pub variation_id: VariationId,
}

/// Usable stock of a variation.
#[must_use]
pub fn effective_stock(status: StockStatus, quantity: Option<i32>) -> i64 {
    match (status, quantity) {
        (StockStatus::InStock, None) => UNTRACKED_STOCK,
        (_, qty) => i64::from(qty.unwrap_or(0)),
    }
}

/// Clamp a requested quantity to `[0, stock]`.
#[must_use]
pub fn clamp_quantity(requested: i64, stock: i64) -> i64 {
    requested.min(stock).max(0)
}

fn is_variation_out_of_stock(variation: &ProductVariation) -> bool {
    variation.stock_status == StockStatus::OutOfStock
        || variation.stock_quantity.is_some_and(|qty| qty <= 0)
}

/// Colours of a product, in the order they first appear.
///
/// Built from the variations' `pa_color` values; when no variation carries a
/// colour, the product's global `pa_color` options are used instead.
#[must_use]
pub fn available_colors(product: &Product) -> Vec<ColorOption> {
    let mut groups: Vec<(&str, Vec<&ProductVariation>)> = Vec::new();
    for variation in &product.variations {
        let Some(color) = variation.attribute(COLOR_ATTRIBUTE) else {
            continue;
        };
        match groups.iter_mut().find(|(name, _)| *name == color) {
            Some((_, members)) => members.push(variation),
            None => groups.push((color, vec![variation])),
        }
    }

    if groups.is_empty() {
        return product
            .attribute(COLOR_ATTRIBUTE)
            .map(|attr| {
                attr.options
                    .iter()
                    .map(|option| ColorOption {
                        name: option.clone(),
                        image: None,
                        stock_status: StockStatus::InStock,
                        stock_quantity: ATTRIBUTE_ONLY_STOCK,
                    })
                    .collect()
            })
            .unwrap_or_default();
    }

    groups
        .into_iter()
        .map(|(name, members)| {
            let out_of_stock = members.iter().all(|v| is_variation_out_of_stock(v));
            ColorOption {
                name: name.to_string(),
                image: members
                    .first()
                    .and_then(|v| v.image.as_ref())
                    .map(|img| img.url.clone()),
                stock_status: if out_of_stock {
                    StockStatus::OutOfStock
                } else {
                    StockStatus::InStock
                },
                stock_quantity: members
                    .iter()
                    .map(|v| effective_stock(v.stock_status, v.stock_quantity))
                    .sum(),
            }
        })
        .collect()
}

/// Sizes offered for one colour.
#[must_use]
pub fn size_options(product: &Product, color: &str) -> Vec<SizeOption> {
    product
        .variations
        .iter()
        .filter(|v| v.attribute(COLOR_ATTRIBUTE) == Some(color))
        .map(|v| SizeOption {
            size: SIZE_ATTRIBUTES
                .iter()
                .find_map(|name| v.attribute(name))
                .unwrap_or(DEFAULT_SIZE)
                .to_string(),
            stock_status: v.stock_status,
            stock_quantity: effective_stock(v.stock_status, v.stock_quantity),
            price: v.price,
            variation_id: v.id,
        })
        .collect()
}

/// Pricing setup of one product.
#[derive(Debug, Clone, Copy)]
pub struct PricingContext {
    pub family: PricingFamily,
    pub data: &'static PricingData,
    /// Print zones the customer can choose from.
    pub zones: &'static [&'static str],
    /// Methods allowed for the product's category.
    pub methods: &'static [PrintingMethod],
}

impl PricingContext {
    /// Resolve the pricing setup from the product's categories.
    #[must_use]
    pub fn for_product(product: &Product) -> Self {
        let family = PricingFamily::for_categories(product.category_slugs());
        let zones = product
            .category_slugs()
            .find_map(allowed_zones_for_category)
            .unwrap_or(family.data().allowed_zones);
        let methods = allowed_methods_for_category(product.category_slugs().next().unwrap_or(""));

        Self {
            family,
            data: family.data(),
            zones,
            methods,
        }
    }

    /// Methods both allowed for the category and active for the family.
    #[must_use]
    pub fn active_methods(&self) -> Vec<PrintingMethod> {
        let printing = self.family.printing();
        self.methods
            .iter()
            .copied()
            .filter(|m| m.is_active() && printing.is_active_in_ui(*m))
            .collect()
    }

    /// Minimum run for the default method.
    #[must_use]
    pub fn min_quantity(&self) -> u32 {
        self.family
            .printing()
            .active_in_ui
            .first()
            .map_or(self.data.min_quantity, |m| {
                self.family.printing().min_quantity_for(*m)
            })
    }

    /// Price a colour/size selection.
    ///
    /// Quantities are clamped to each size's stock, unknown sizes and zones
    /// are dropped. A product without variations is priced as a single
    /// `Única` line holding the sum of the requested quantities. No calculation is returned for an empty selection or a
    /// product without a base price.
    #[must_use]
    pub fn summarize(
        &self,
        product: &Product,
        color: &str,
        quantities: &BTreeMap<String, i64>,
        zones: &[String],
    ) -> SelectionSummary {
        let lines: Vec<SizeLine> = if product.variations.is_empty() {
            let stock = effective_stock(product.stock_status, product.stock_quantity);
            let requested = quantities
                .values()
                .map(|qty| clamp_quantity(*qty, stock))
                .fold(0_i64, i64::saturating_add);
            let quantity = clamp_quantity(requested, stock);
            (quantity > 0)
                .then(|| SizeLine {
                    size: DEFAULT_SIZE.to_string(),
                    variation_id: None,
                    quantity,
                })
                .into_iter()
                .collect()
        } else {
            size_options(product, color)
                .into_iter()
                .filter_map(|option| {
                    let requested = quantities.get(&option.size).copied().unwrap_or(0);
                    let quantity = clamp_quantity(requested, option.stock_quantity);
                    (quantity > 0).then(|| SizeLine {
                        size: option.size,
                        variation_id: Some(option.variation_id),
                        quantity,
                    })
                })
                .collect()
        };

        let zones: Vec<String> = zones
            .iter()
            .filter(|z| self.zones.contains(&z.as_str()))
            .cloned()
            .collect();

        let total_quantity = lines
            .iter()
            .map(|l| l.quantity)
            .fold(0_i64, i64::saturating_add);
        let calculation = match (product.base_price(), u32::try_from(total_quantity)) {
            (Some(base), Ok(total)) if total > 0 => {
                Some(calculate_scaled_price(base, total, &zones, self.data))
            }
            _ => None,
        };

        SelectionSummary {
            color: color.to_string(),
            lines,
            zones,
            total_quantity,
            calculation,
        }
    }
}

/// Quantity chosen for one size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeLine {
    pub size: String,
    /// `None` for products without variations.
    pub variation_id: Option<VariationId>,
    pub quantity: i64,
}

/// A priced selection.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionSummary {
    pub color: String,
    pub lines: Vec<SizeLine>,
    pub zones: Vec<String>,
    pub total_quantity: i64,
    pub calculation: Option<PriceCalculation>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::{CategoryRef, ProductAttribute, ProductType, VariationAttribute};
    use impacto33_core::ProductId;

    fn variation(id: i32, color: &str, size: &str, status: StockStatus, qty: Option<i32>) -> ProductVariation {
        ProductVariation {
            id: VariationId::new(id),
            name: format!("Camiseta - {color} - {size}"),
            description: None,
            sku: None,
            price: Some(Decimal::from(6)),
            regular_price: Some(Decimal::from(6)),
            sale_price: None,
            stock_status: status,
            stock_quantity: qty,
            image: None,
            attributes: vec![
                VariationAttribute {
                    name: "pa_color".to_string(),
                    value: color.to_string(),
                },
                VariationAttribute {
                    name: "pa_size".to_string(),
                    value: size.to_string(),
                },
            ],
        }
    }

    fn product(variations: Vec<ProductVariation>) -> Product {
        Product {
            id: ProductId::new(10),
            global_id: "cHJvZHVjdDoxMA==".to_string(),
            name: "Camiseta".to_string(),
            slug: "camiseta".to_string(),
            sku: None,
            product_type: ProductType::Variable,
            featured: false,
            description: None,
            short_description: None,
            price: Some(Decimal::from(6)),
            regular_price: Some(Decimal::from(6)),
            sale_price: None,
            stock_status: StockStatus::InStock,
            stock_quantity: None,
            image: None,
            gallery: vec![],
            categories: vec![CategoryRef {
                database_id: 1,
                name: "Camisetas".to_string(),
                slug: "t_shirts".to_string(),
            }],
            attributes: vec![ProductAttribute {
                name: "pa_color".to_string(),
                label: Some("Color".to_string()),
                options: vec!["rojo".to_string(), "azul".to_string()],
                variation: true,
            }],
            variations,
            related: vec![],
            modified: None,
        }
    }

    #[test]
    fn test_effective_stock() {
        assert_eq!(effective_stock(StockStatus::InStock, None), 9999);
        assert_eq!(effective_stock(StockStatus::InStock, Some(12)), 12);
        assert_eq!(effective_stock(StockStatus::OutOfStock, None), 0);
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(-3, 10), 0);
        assert_eq!(clamp_quantity(15, 10), 10);
        assert_eq!(clamp_quantity(7, 10), 7);
    }

    #[test]
    fn test_colors_grouped_from_variations() {
        let p = product(vec![
            variation(1, "rojo", "M", StockStatus::InStock, Some(5)),
            variation(2, "rojo", "L", StockStatus::InStock, None),
            variation(3, "azul", "M", StockStatus::OutOfStock, None),
        ]);
        let colors = available_colors(&p);
        assert_eq!(colors.len(), 2);
        assert_eq!(colors[0].name, "rojo");
        assert_eq!(colors[0].stock_quantity, 10_004);
        assert_eq!(colors[1].stock_status, StockStatus::OutOfStock);
    }

    #[test]
    fn test_colors_fall_back_to_attribute_options() {
        let colors = available_colors(&product(vec![]));
        assert_eq!(colors.len(), 2);
        assert!(colors.iter().all(|c| c.stock_quantity == 999));
    }

    #[test]
    fn test_size_defaults_to_unica() {
        let mut v = variation(1, "rojo", "M", StockStatus::InStock, None);
        v.attributes.truncate(1);
        let sizes = size_options(&product(vec![v]), "rojo");
        assert_eq!(sizes[0].size, "Única");
    }

    #[test]
    fn test_summarize_clamps_and_prices() {
        let p = product(vec![
            variation(1, "rojo", "M", StockStatus::InStock, Some(20)),
            variation(2, "rojo", "L", StockStatus::InStock, None),
        ]);
        let ctx = PricingContext::for_product(&p);
        assert_eq!(ctx.family, PricingFamily::Ropa);

        let quantities = BTreeMap::from([
            ("M".to_string(), 30),
            ("L".to_string(), 30),
            ("XXL".to_string(), 5),
        ]);
        let zones = vec!["frontal".to_string(), "tejado".to_string()];
        let summary = ctx.summarize(&p, "rojo", &quantities, &zones);

        assert_eq!(summary.total_quantity, 50);
        assert_eq!(summary.zones, vec!["frontal".to_string()]);
        let calc = summary.calculation.unwrap();
        // (6 / 2 + 0.45) × 3.69
        assert_eq!(calc.unit_price, Decimal::new(127_305, 4));
        assert!(calc.meets_minimum);
    }

    #[test]
    fn test_summarize_empty_selection() {
        let p = product(vec![variation(1, "rojo", "M", StockStatus::InStock, None)]);
        let ctx = PricingContext::for_product(&p);
        let summary = ctx.summarize(&p, "rojo", &BTreeMap::new(), &[]);
        assert!(summary.calculation.is_none());
    }

    #[test]
    fn test_summarize_simple_product() {
        let mut p = product(vec![]);
        p.stock_quantity = Some(40);
        let ctx = PricingContext::for_product(&p);
        let quantities = BTreeMap::from([("Única".to_string(), 30), ("M".to_string(), 20)]);
        let summary = ctx.summarize(&p, "", &quantities, &[]);

        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.lines[0].variation_id, None);
        assert_eq!(summary.total_quantity, 40);
        assert!(summary.calculation.is_some());
    }

    #[test]
    fn test_summarize_huge_quantities_clamped() {
        let mut p = product(vec![]);
        p.stock_quantity = Some(500);
        let ctx = PricingContext::for_product(&p);
        let quantities = BTreeMap::from([("Única".to_string(), i64::MAX), ("M".to_string(), i64::MAX)]);
        let summary = ctx.summarize(&p, "", &quantities, &[]);
        assert_eq!(summary.total_quantity, 500);

        let variable = product(vec![
            variation(1, "rojo", "M", StockStatus::InStock, None),
            variation(2, "rojo", "L", StockStatus::InStock, None),
        ]);
        let ctx = PricingContext::for_product(&variable);
        let quantities = BTreeMap::from([("M".to_string(), i64::MAX), ("L".to_string(), i64::MAX)]);
        let summary = ctx.summarize(&variable, "rojo", &quantities, &[]);
        assert_eq!(summary.total_quantity, 2 * 9999);
    }

    #[test]
    fn test_active_methods_for_textile() {
        let ctx = PricingContext::for_product(&product(vec![]));
        assert_eq!(ctx.active_methods(), vec![PrintingMethod::Dtf]);
        assert_eq!(ctx.min_quantity(), 25);
    }
}
