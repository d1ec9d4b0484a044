//! Product route handlers.
//!
//! The detail page carries the personalisation flow: pick a colour, enter a
//! quantity per size, tick print zones. Every change posts the form to
//! `/producto/{slug}/precio`, which answers with the price summary fragment.

use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::catalog::{CatalogError, Image, Product, StockStatus};
use crate::db::{ViewedProductRepository, WishlistRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::pricing::{
    ColorOption, PricingContext, SelectionSummary, SizeOption, available_colors, format_euro,
    size_options, zone_label,
};
use crate::routes::form::FormPairs;
use crate::routes::layout::PageLayout;
use crate::routes::pages::not_found_page;
use crate::routes::views::{ProductCard, cards};
use crate::state::AppState;

/// Related products shown under the detail.
const RELATED_LIMIT: usize = 4;

// =============================================================================
// Selection
// =============================================================================

/// What the customer picked on the product page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionInput {
    pub color: String,
    /// Requested units per size, from `qty[SIZE]` fields.
    pub quantities: BTreeMap<String, i64>,
    pub zones: Vec<String>,
    pub printing_method: Option<String>,
    pub notes: Option<String>,
}

impl SelectionInput {
    /// Read the selection from raw form pairs.
    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let form = FormPairs(pairs);
        Self {
            color: form.first("color").unwrap_or_default().to_string(),
            quantities: form.quantities("qty"),
            zones: form.all("zone"),
            printing_method: form.first("printing_method").map(str::to_string),
            notes: form
                .first("notes")
                .map(|notes| notes.chars().take(500).collect()),
        }
    }

    /// Price the selection against the product.
    #[must_use]
    pub fn summarize(&self, product: &Product) -> SelectionSummary {
        PricingContext::for_product(product).summarize(
            product,
            &self.color,
            &self.quantities,
            &self.zones,
        )
    }
}

// =============================================================================
// View types
// =============================================================================

/// Print zone checkbox.
#[derive(Debug, Clone)]
pub struct ZoneView {
    pub id: &'static str,
    pub label: &'static str,
    pub cost: String,
}

/// Price summary fragment data.
#[derive(Debug, Clone, Default)]
pub struct PriceSummaryView {
    pub has_price: bool,
    pub lines: Vec<(String, i64)>,
    pub zones: Vec<String>,
    pub total_quantity: i64,
    pub min_quantity: u32,
    pub meets_minimum: bool,
    pub unit_price: String,
    pub personalization_price: String,
    pub total_without_vat: String,
    pub total_with_vat: String,
}

impl From<&SelectionSummary> for PriceSummaryView {
    fn from(summary: &SelectionSummary) -> Self {
        let mut view = Self {
            lines: summary
                .lines
                .iter()
                .map(|l| (l.size.clone(), l.quantity))
                .collect(),
            zones: summary
                .zones
                .iter()
                .map(|z| zone_label(z).to_string())
                .collect(),
            total_quantity: summary.total_quantity,
            ..Self::default()
        };
        if let Some(calc) = &summary.calculation {
            view.has_price = true;
            view.min_quantity = calc.min_quantity;
            view.meets_minimum = calc.meets_minimum;
            view.unit_price = format_euro(calc.unit_price);
            view.personalization_price = format_euro(calc.personalization_price);
            view.total_without_vat = format_euro(calc.total_without_vat);
            view.total_with_vat = format_euro(calc.total_with_vat);
        }
        view
    }
}

/// Product detail display data.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub sku: Option<String>,
    /// WooCommerce HTML, rendered as-is.
    pub description: String,
    pub short_description: String,
    pub list_price: Option<String>,
    pub regular_price: Option<String>,
    pub on_sale: bool,
    pub in_stock: bool,
    pub category: Option<String>,
    pub images: Vec<Image>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let mut images: Vec<Image> = product.image.iter().cloned().collect();
        images.extend(
            product
                .gallery
                .iter()
                .filter(|img| Some(&img.url) != product.image.as_ref().map(|i| &i.url))
                .cloned(),
        );
        Self {
            id: product.id.into_inner(),
            name: product.name.clone(),
            slug: product.slug.clone(),
            sku: product.sku.clone(),
            description: product.description.clone().unwrap_or_default(),
            short_description: product.short_description.clone().unwrap_or_default(),
            list_price: product.display_price().map(format_euro),
            regular_price: product.regular_price.map(format_euro),
            on_sale: product.is_on_sale(),
            in_stock: product.stock_status.is_purchasable(),
            category: product.categories.first().map(|c| c.name.clone()),
            images,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: PageLayout,
    pub product: ProductView,
    pub colors: Vec<ColorOption>,
    pub selected_color: String,
    pub sizes: Vec<SizeOption>,
    pub zones: Vec<ZoneView>,
    pub methods: Vec<(&'static str, &'static str)>,
    pub min_quantity: u32,
    pub family_notes: &'static str,
    pub from_price: Option<String>,
    pub summary: PriceSummaryView,
    pub in_wishlist: bool,
    pub related: Vec<ProductCard>,
}

/// Price summary fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/price_summary.html")]
pub struct PriceSummaryTemplate {
    pub slug: String,
    pub summary: PriceSummaryView,
}

/// Colour picker query.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub color: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display a product.
///
/// Signed-in views are recorded in the background; failures there never
/// affect the page.
#[instrument(skip(state, nonce, user))]
pub async fn show(
    State(state): State<AppState>,
    nonce: CspNonce,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
    Query(query): Query<ProductQuery>,
) -> Result<Response> {
    let product = match state.catalog().get_product_by_slug(&slug).await {
        Ok(product) => product,
        Err(CatalogError::NotFound(_)) => {
            return Ok(not_found_page(nonce, user.as_ref()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut in_wishlist = false;
    if let Some(user) = &user {
        let pool = state.pool().clone();
        let (user_id, product_id) = (user.id, product.id);
        tokio::spawn(async move {
            if let Err(e) = ViewedProductRepository::new(&pool)
                .track(user_id, product_id)
                .await
            {
                tracing::warn!(error = %e, %product_id, "Failed to record product view");
            }
        });

        in_wishlist = WishlistRepository::new(state.pool())
            .is_in_wishlist(user.id, product.id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to read wishlist state");
                false
            });
    }

    let context = PricingContext::for_product(&product);
    let colors = available_colors(&product);
    let selected_color = query
        .color
        .filter(|c| colors.iter().any(|o| &o.name == c))
        .or_else(|| {
            colors
                .iter()
                .find(|c| c.stock_status != StockStatus::OutOfStock)
                .or_else(|| colors.first())
                .map(|c| c.name.clone())
        })
        .unwrap_or_default();
    let sizes = size_options(&product, &selected_color);

    let zones = context
        .zones
        .iter()
        .map(|zone| ZoneView {
            id: zone,
            label: zone_label(zone),
            cost: zone_cost_label(context.data.zone_cost(zone)),
        })
        .collect();

    let description = product
        .short_description
        .as_deref()
        .map(crate::feeds::merchant::clean_description)
        .unwrap_or_default();

    Ok(ProductShowTemplate {
        layout: PageLayout::new(nonce, Some(&product.name))
            .with_description(&description)
            .with_user(user.as_ref())
            .with_canonical(state.config().absolute_url(&format!("/producto/{}", product.slug))),
        colors,
        selected_color,
        sizes,
        zones,
        methods: context
            .active_methods()
            .into_iter()
            .map(|m| (m.id(), m.label()))
            .collect(),
        min_quantity: context.min_quantity(),
        family_notes: context.data.notes,
        from_price: product
            .base_price()
            .map(|base| format_euro(crate::pricing::from_price(base, context.data))),
        summary: PriceSummaryView::default(),
        in_wishlist,
        related: cards(&product.related)
            .into_iter()
            .filter(|c| c.id != product.id)
            .take(RELATED_LIMIT)
            .collect(),
        product: ProductView::from(&product),
    }
    .into_response())
}

/// Price the current selection (HTMX).
#[instrument(skip(state, pairs))]
pub async fn price(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<impl IntoResponse> {
    let product = state.catalog().get_product_by_slug(&slug).await?;
    let selection = SelectionInput::from_pairs(&pairs);
    let summary = selection.summarize(&product);

    Ok(PriceSummaryTemplate {
        slug,
        summary: PriceSummaryView::from(&summary),
    })
}

/// Decimal cost as shown next to a zone.
#[must_use]
pub fn zone_cost_label(cost: Decimal) -> String {
    if cost.is_zero() {
        "Incluido".to_string()
    } else {
        format!("+{}", format_euro(cost))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_selection_from_pairs() {
        let raw = pairs(&[
            ("slug", "camiseta-basica"),
            ("color", "Rojo"),
            ("qty[M]", "30"),
            ("qty[L]", ""),
            ("zone", "frontal"),
            ("zone", "espalda"),
            ("printing_method", "DTF"),
            ("notes", ""),
        ]);
        let selection = SelectionInput::from_pairs(&raw);

        assert_eq!(selection.color, "Rojo");
        assert_eq!(selection.quantities, BTreeMap::from([("M".to_string(), 30)]));
        assert_eq!(selection.zones, vec!["frontal", "espalda"]);
        assert_eq!(selection.printing_method.as_deref(), Some("DTF"));
        assert_eq!(selection.notes, None);
    }

    #[test]
    fn test_empty_summary_has_no_price() {
        let summary = SelectionSummary {
            color: String::new(),
            lines: vec![],
            zones: vec!["frontal".to_string()],
            total_quantity: 0,
            calculation: None,
        };
        let view = PriceSummaryView::from(&summary);
        assert!(!view.has_price);
        assert_eq!(view.zones, vec!["Frontal"]);
    }

    #[test]
    fn test_zone_cost_label() {
        assert_eq!(zone_cost_label(Decimal::ZERO), "Incluido");
        assert_eq!(zone_cost_label(Decimal::new(45, 2)), "+0,45\u{a0}€");
    }
}
