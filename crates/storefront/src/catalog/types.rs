//! Domain types for the WooCommerce catalog.
//!
//! These types provide a clean, ergonomic API separate from the raw WPGraphQL
//! response shapes in `client::queries`.

use impacto33_core::{ProductId, VariationId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// WooCommerce product type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    #[default]
    Simple,
    Variable,
    External,
    Grouped,
}

impl ProductType {
    /// Parse the WPGraphQL enum value, defaulting to `Simple`.
    #[must_use]
    pub fn from_graphql(value: Option<&str>) -> Self {
        match value {
            Some("VARIABLE") => Self::Variable,
            Some("EXTERNAL") => Self::External,
            Some("GROUPED") => Self::Grouped,
            _ => Self::Simple,
        }
    }
}

/// Stock status of a product or variation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    #[default]
    InStock,
    OutOfStock,
    OnBackorder,
}

impl StockStatus {
    /// Parse the WPGraphQL enum value, defaulting to `InStock`.
    #[must_use]
    pub fn from_graphql(value: Option<&str>) -> Self {
        match value {
            Some("OUT_OF_STOCK") => Self::OutOfStock,
            Some("ON_BACKORDER") => Self::OnBackorder,
            _ => Self::InStock,
        }
    }

    /// Whether the item can be added to a cart.
    #[must_use]
    pub const fn is_purchasable(self) -> bool {
        !matches!(self, Self::OutOfStock)
    }
}

// =============================================================================
// Images & Categories
// =============================================================================

/// Product or category image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Full-size image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
}

impl Image {
    /// Alt text, falling back to the given label.
    #[must_use]
    pub fn alt_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.alt_text
            .as_deref()
            .filter(|alt| !alt.is_empty())
            .unwrap_or(fallback)
    }
}

/// A product category, optionally with its direct children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub database_id: i32,
    pub name: String,
    pub slug: String,
    /// Number of published products.
    pub count: Option<i32>,
    pub image: Option<Image>,
    /// Slug of the parent category, `None` for top-level categories.
    pub parent_slug: Option<String>,
    pub children: Vec<Category>,
}

impl Category {
    /// Whether the category sits at the top of the tree.
    #[must_use]
    pub const fn is_top_level(&self) -> bool {
        self.parent_slug.is_none()
    }
}

/// Minimal category reference carried on products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub database_id: i32,
    pub name: String,
    pub slug: String,
}

// =============================================================================
// Attributes
// =============================================================================

/// A product-level attribute such as `pa_color` with all its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    /// Taxonomy name, e.g. `pa_color`.
    pub name: String,
    /// Human label, e.g. `Color`.
    pub label: Option<String>,
    pub options: Vec<String>,
    /// Whether the attribute is used to build variations.
    pub variation: bool,
}

/// The value a variation takes for one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationAttribute {
    pub name: String,
    pub value: String,
}

// =============================================================================
// Products
// =============================================================================

/// A purchasable variation of a variable product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariation {
    pub id: VariationId,
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub regular_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub stock_status: StockStatus,
    pub stock_quantity: Option<i32>,
    pub image: Option<Image>,
    pub attributes: Vec<VariationAttribute>,
}

impl ProductVariation {
    /// Value of the attribute with the given taxonomy name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_str())
    }
}

/// A catalog product.
///
/// Listing queries only fill the card fields; `get_product_by_slug` fills
/// descriptions, gallery, attributes, variations and related products too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// WooCommerce `databaseId`.
    pub id: ProductId,
    /// Relay global id.
    pub global_id: String,
    pub name: String,
    pub slug: String,
    pub sku: Option<String>,
    pub product_type: ProductType,
    pub featured: bool,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Option<Decimal>,
    pub regular_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub stock_status: StockStatus,
    pub stock_quantity: Option<i32>,
    pub image: Option<Image>,
    pub gallery: Vec<Image>,
    pub categories: Vec<CategoryRef>,
    pub attributes: Vec<ProductAttribute>,
    pub variations: Vec<ProductVariation>,
    pub related: Vec<Product>,
    /// Last modification date as reported by WordPress.
    pub modified: Option<String>,
}

impl Product {
    /// Price shown on cards: sale, then current, then regular.
    #[must_use]
    pub fn display_price(&self) -> Option<Decimal> {
        self.sale_price.or(self.price).or(self.regular_price)
    }

    /// Base price used by the pricing engine.
    #[must_use]
    pub fn base_price(&self) -> Option<Decimal> {
        self.regular_price.or(self.price)
    }

    /// Whether a sale price below the regular price is active.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        matches!((self.sale_price, self.regular_price), (Some(sale), Some(regular)) if sale < regular)
    }

    /// Global attribute with the given taxonomy name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&ProductAttribute> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    /// Slugs of all categories, in the order WooCommerce returned them.
    pub fn category_slugs(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.slug.as_str())
    }
}

/// Pagination info for cursor-based listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// One page of products.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductConnection {
    pub nodes: Vec<Product>,
    pub page_info: PageInfo,
}

/// The slice of a product the sitemap needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapProduct {
    pub slug: String,
    pub modified: Option<String>,
    pub image_url: Option<String>,
}

// =============================================================================
// Price parsing
// =============================================================================

/// Parse a WooCommerce formatted price into a decimal.
///
/// WPGraphQL returns prices already formatted for the shop locale, e.g.
/// `"12,50&nbsp;€"` or a range `"5,00€ - 9,00€"` for variable products. The
/// first number is taken; a comma is the decimal separator and dots group
/// thousands. Returns `None` when the string holds no number.
#[must_use]
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let cleaned = raw.replace("&nbsp;", " ").replace("&#8364;", "€");
    let start = cleaned.find(|c: char| c.is_ascii_digit())?;
    let token: String = cleaned[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let token = token.trim_end_matches(['.', ',']);

    let normalized = if token.contains(',') {
        token.replace('.', "").replace(',', ".")
    } else if looks_like_thousands(token) {
        token.replace('.', "")
    } else {
        token.to_string()
    };

    normalized.parse::<Decimal>().ok()
}

/// `1.234` and `1.234.567` group thousands; `12.5` and `12.50` are decimals.
fn looks_like_thousands(token: &str) -> bool {
    let dots = token.matches('.').count();
    dots > 1 || (dots == 1 && token.rsplit('.').next().is_some_and(|tail| tail.len() == 3))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_woocommerce_formats() {
        assert_eq!(parse_price("12,50&nbsp;€"), Some(Decimal::new(1250, 2)));
        assert_eq!(parse_price("€12.50"), Some(Decimal::new(1250, 2)));
        assert_eq!(parse_price("1.234,56 €"), Some(Decimal::new(123_456, 2)));
        assert_eq!(parse_price("3"), Some(Decimal::new(3, 0)));
    }

    #[test]
    fn test_parse_price_range_takes_first() {
        assert_eq!(parse_price("5,00€ - 9,00€"), Some(Decimal::new(500, 2)));
    }

    #[test]
    fn test_parse_price_thousands_without_decimals() {
        assert_eq!(parse_price("1.234€"), Some(Decimal::new(1234, 0)));
        assert_eq!(parse_price("1.234.567"), Some(Decimal::new(1_234_567, 0)));
    }

    #[test]
    fn test_parse_price_absent() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("Consultar"), None);
    }

    #[test]
    fn test_enum_parsing_defaults() {
        assert_eq!(ProductType::from_graphql(Some("VARIABLE")), ProductType::Variable);
        assert_eq!(ProductType::from_graphql(None), ProductType::Simple);
        assert_eq!(StockStatus::from_graphql(Some("ON_BACKORDER")), StockStatus::OnBackorder);
        assert_eq!(StockStatus::from_graphql(Some("???")), StockStatus::InStock);
        assert!(!StockStatus::OutOfStock.is_purchasable());
    }

    #[test]
    fn test_variation_attribute_lookup_is_case_insensitive() {
        let variation = ProductVariation {
            id: VariationId::new(10),
            name: "Camiseta - Rojo - M".to_string(),
            description: None,
            sku: None,
            price: None,
            regular_price: None,
            sale_price: None,
            stock_status: StockStatus::InStock,
            stock_quantity: None,
            image: None,
            attributes: vec![VariationAttribute {
                name: "pa_color".to_string(),
                value: "rojo".to_string(),
            }],
        };
        assert_eq!(variation.attribute("PA_COLOR"), Some("rojo"));
        assert_eq!(variation.attribute("pa_size"), None);
    }
}
