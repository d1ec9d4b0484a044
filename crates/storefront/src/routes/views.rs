//! View models shared by several pages.

use std::collections::HashMap;

use impacto33_core::ProductId;

use crate::catalog::{Category, Product, StockStatus};
use crate::pricing::{PricingContext, format_euro, from_price};

/// Product tile used in grids and carousels.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub image_alt: String,
    /// Lowest unit price at the highest quantity tier, e.g. `1,23 €`.
    pub from_price: Option<String>,
    /// Catalog price as listed in WooCommerce.
    pub list_price: Option<String>,
    pub on_sale: bool,
    pub out_of_stock: bool,
}

impl ProductCard {
    #[must_use]
    pub fn url(&self) -> String {
        format!("/producto/{}", self.slug)
    }
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        let context = PricingContext::for_product(product);
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            image_url: product.image.as_ref().map(|img| img.url.clone()),
            image_alt: product
                .image
                .as_ref()
                .map_or(product.name.as_str(), |img| img.alt_or(&product.name))
                .to_string(),
            from_price: product
                .base_price()
                .map(|base| format_euro(from_price(base, context.data))),
            list_price: product.display_price().map(format_euro),
            on_sale: product.is_on_sale(),
            out_of_stock: product.stock_status == StockStatus::OutOfStock,
        }
    }
}

/// Cards for a product list.
#[must_use]
pub fn cards(products: &[Product]) -> Vec<ProductCard> {
    products.iter().map(ProductCard::from).collect()
}

/// Cards in the order of `ids`, skipping products the catalog did not return.
#[must_use]
pub fn cards_in_order(ids: &[ProductId], products: &[Product]) -> Vec<ProductCard> {
    let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(**id))
        .filter_map(|id| by_id.get(id).map(|p| ProductCard::from(*p)))
        .collect()
}

/// Category tile on the home page.
#[derive(Debug, Clone)]
pub struct CategoryCard {
    pub name: String,
    pub url: String,
    pub image_url: Option<String>,
    pub count: i32,
}

impl From<&Category> for CategoryCard {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            url: format!("/{}/", category.slug.replace('_', "-")),
            image_url: category.image.as_ref().map(|img| img.url.clone()),
            count: category.count.unwrap_or(0),
        }
    }
}
