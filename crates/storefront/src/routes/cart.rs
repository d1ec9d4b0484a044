//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Carts live in Postgres and belong to the signed-in user. Prices are
//! recomputed on the server from the catalog; the browser only sends the
//! selection.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use impacto33_core::{CartItemId, add_vat, round_cents};

use crate::catalog::{CatalogError, Product};
use crate::db::{CartRepository, RepositoryError};
use crate::error::Result;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, RequireAuth};
use crate::models::{CartItem, CartWithItems, Customization, NewCartItem};
use crate::pricing::{SelectionSummary, format_euro};
use crate::routes::auth::{Flash, MessageQuery};
use crate::routes::form::FormPairs;
use crate::routes::layout::PageLayout;
use crate::routes::orders::customization_summary;
use crate::routes::products::SelectionInput;
use crate::state::AppState;

// =============================================================================
// View types
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub sku: Option<String>,
    pub image: Option<String>,
    pub variation: String,
    pub customization: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_price: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.product_name.clone(),
            sku: item.product_sku.clone(),
            image: item.product_image.clone(),
            variation: item.variation_label(),
            customization: customization_summary(item.customization.as_ref()),
            quantity: item.quantity,
            unit_price: format_euro(item.unit_price_with_vat),
            line_price: format_euro(item.total_price_with_vat),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub vat_amount: String,
    pub total: String,
    pub item_count: i64,
}

impl From<&CartWithItems> for CartView {
    fn from(cart: &CartWithItems) -> Self {
        Self {
            items: cart.items.iter().map(CartItemView::from).collect(),
            subtotal: format_euro(cart.cart.subtotal),
            vat_amount: format_euro(cart.cart.vat_amount),
            total: format_euro(cart.cart.total),
            item_count: cart.item_count(),
        }
    }
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Form types
// =============================================================================

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: CartItemId,
    pub quantity: i32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: CartItemId,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: PageLayout,
    pub flash: Flash,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: i64,
}

/// Confirmation shown under the add-to-cart button (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_added.html")]
pub struct CartAddedTemplate {
    pub units: i64,
    pub count: i64,
}

// =============================================================================
// Line building
// =============================================================================

/// Turn a priced selection into cart lines, one per size.
///
/// # Errors
///
/// Returns a customer-facing message when nothing is selected or the
/// family's minimum run is not reached.
pub fn build_cart_lines(
    product: &Product,
    selection: &SelectionInput,
    summary: &SelectionSummary,
) -> std::result::Result<Vec<NewCartItem>, String> {
    let Some(calculation) = &summary.calculation else {
        return Err("Selecciona al menos una unidad.".to_string());
    };
    if !calculation.meets_minimum {
        return Err(format!(
            "El pedido mínimo para este producto es de {} unidades.",
            calculation.min_quantity
        ));
    }

    let unit_price_with_vat = round_cents(add_vat(calculation.unit_price));
    let customization = Customization {
        zones: summary.zones.clone(),
        printing_method: selection.printing_method.clone(),
        color: (!summary.color.is_empty()).then(|| summary.color.clone()),
        notes: selection.notes.clone(),
    };

    summary
        .lines
        .iter()
        .map(|line| {
            let variation = line
                .variation_id
                .and_then(|id| product.variations.iter().find(|v| v.id == id));

            let mut attributes = serde_json::Map::new();
            if variation.is_some() {
                if !summary.color.is_empty() {
                    attributes.insert("pa_color".to_string(), summary.color.clone().into());
                }
                attributes.insert("pa_size".to_string(), line.size.clone().into());
            }

            Ok(NewCartItem {
                product_id: product.id,
                variation_id: line.variation_id,
                product_name: product.name.clone(),
                product_sku: variation
                    .and_then(|v| v.sku.clone())
                    .or_else(|| product.sku.clone()),
                product_image: variation
                    .and_then(|v| v.image.as_ref())
                    .or(product.image.as_ref())
                    .map(|img| img.url.clone()),
                variation_attributes: serde_json::Value::Object(attributes),
                quantity: i32::try_from(line.quantity)
                    .map_err(|_| "Cantidad no válida.".to_string())?,
                unit_price_with_vat,
                customization: Some(customization.clone()),
            })
        })
        .collect()
}

/// Inline error under the add-to-cart button. Messages are server-written.
fn error_fragment(status: StatusCode, message: &str) -> Response {
    (
        status,
        Html(format!(
            "<p class=\"text-sm text-red-600\" role=\"alert\">{message}</p>"
        )),
    )
        .into_response()
}

async fn items_fragment(state: &AppState, user_id: impacto33_core::UserId) -> Result<Response> {
    let cart = CartRepository::new(state.pool())
        .get_active_cart_with_items(user_id)
        .await?;
    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::from(&cart),
        },
    )
        .into_response())
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, nonce, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    nonce: CspNonce,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let cart = CartRepository::new(state.pool())
        .get_active_cart_with_items(user.id)
        .await?;

    Ok(CartShowTemplate {
        layout: PageLayout::new(nonce, Some("Carrito"))
            .with_user(Some(&user))
            .private(),
        flash: Flash::from(&query),
        cart: CartView::from(&cart),
    })
}

/// Add a personalised selection to the cart (HTMX).
///
/// The product is re-read from the catalog and priced here; each size
/// becomes its own line.
#[instrument(skip(state, user, pairs), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let Some(slug) = FormPairs(&pairs).first("slug").map(str::to_string) else {
        return Ok(error_fragment(StatusCode::BAD_REQUEST, "Producto no indicado."));
    };
    let product = match state.catalog().get_product_by_slug(&slug).await {
        Ok(product) => product,
        Err(CatalogError::NotFound(_)) => {
            return Ok(error_fragment(StatusCode::NOT_FOUND, "Producto no encontrado."));
        }
        Err(e) => return Err(e.into()),
    };

    let selection = SelectionInput::from_pairs(&pairs);
    let summary = selection.summarize(&product);
    let lines = match build_cart_lines(&product, &selection, &summary) {
        Ok(lines) => lines,
        Err(message) => return Ok(error_fragment(StatusCode::UNPROCESSABLE_ENTITY, &message)),
    };

    let repo = CartRepository::new(state.pool());
    repo.add_items(user.id, &lines).await?;
    let count = repo.item_count(user.id).await?;

    tracing::info!(
        product_id = %product.id,
        lines = lines.len(),
        units = summary.total_quantity,
        "Added to cart"
    );

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartAddedTemplate {
            units: summary.total_quantity,
            count,
        },
    )
        .into_response())
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    match CartRepository::new(state.pool())
        .update_item_quantity(user.id, form.item_id, form.quantity)
        .await
    {
        Ok(_) | Err(RepositoryError::NotFound) => items_fragment(&state, user.id).await,
        Err(e) => Err(e.into()),
    }
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    match CartRepository::new(state.pool())
        .remove_item(user.id, form.item_id)
        .await
    {
        Ok(_) | Err(RepositoryError::NotFound) => items_fragment(&state, user.id).await,
        Err(e) => Err(e.into()),
    }
}

/// Empty the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: axum::http::HeaderMap,
) -> Result<Response> {
    CartRepository::new(state.pool()).clear_cart(user.id).await?;
    tracing::info!("Cart cleared");

    if headers.contains_key("HX-Request") {
        items_fragment(&state, user.id).await
    } else {
        Ok(Redirect::to("/carrito").into_response())
    }
}

/// Get cart count badge (HTMX). Anonymous visitors always see zero.
#[instrument(skip(state, user))]
pub async fn count(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    let count = match user {
        Some(user) => CartRepository::new(state.pool())
            .item_count(user.id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to count cart items");
                0
            }),
        None => 0,
    };

    CartCountTemplate { count }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/checkout.html")]
pub struct CheckoutTemplate {
    pub layout: PageLayout,
    pub cart: CartView,
    pub stripe_enabled: bool,
    pub stripe_public_key: String,
    pub disabled_message: &'static str,
}

/// Checkout summary. Payment itself is not wired up yet.
#[instrument(skip(state, nonce, user), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    nonce: CspNonce,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let cart = CartRepository::new(state.pool())
        .get_active_cart_with_items(user.id)
        .await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/carrito").into_response());
    }

    let stripe = &state.config().stripe;
    Ok(CheckoutTemplate {
        layout: PageLayout::new(nonce, Some("Finalizar pedido"))
            .with_user(Some(&user))
            .private(),
        cart: CartView::from(&cart),
        stripe_enabled: stripe.is_stripe_enabled(),
        stripe_public_key: if stripe.is_stripe_enabled() {
            stripe.public_key.clone()
        } else {
            String::new()
        },
        disabled_message: stripe.disabled_message(),
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::catalog::{
        CategoryRef, Image, ProductType, ProductVariation, StockStatus, VariationAttribute,
    };
    use impacto33_core::{ProductId, VariationId};
    use rust_decimal::Decimal;

    fn shirt() -> Product {
        let variation = |id: i32, size: &str| ProductVariation {
            id: VariationId::new(id),
            name: format!("Camiseta - Rojo - {size}"),
            description: None,
            sku: Some(format!("CAM-R-{size}")),
            price: Some(Decimal::from(6)),
            regular_price: Some(Decimal::from(6)),
            sale_price: None,
            stock_status: StockStatus::InStock,
            stock_quantity: None,
            image: None,
            attributes: vec![
                VariationAttribute {
                    name: "pa_color".to_string(),
                    value: "Rojo".to_string(),
                },
                VariationAttribute {
                    name: "pa_size".to_string(),
                    value: size.to_string(),
                },
            ],
        };
        Product {
            id: ProductId::new(10),
            global_id: String::new(),
            name: "Camiseta".to_string(),
            slug: "camiseta".to_string(),
            sku: Some("CAM".to_string()),
            product_type: ProductType::Variable,
            featured: false,
            description: None,
            short_description: None,
            price: Some(Decimal::from(6)),
            regular_price: Some(Decimal::from(6)),
            sale_price: None,
            stock_status: StockStatus::InStock,
            stock_quantity: None,
            image: Some(Image {
                url: "https://cdn.example.com/camiseta.jpg".to_string(),
                alt_text: None,
            }),
            gallery: vec![],
            categories: vec![CategoryRef {
                database_id: 1,
                name: "Camisetas".to_string(),
                slug: "t_shirts".to_string(),
            }],
            attributes: vec![],
            variations: vec![variation(11, "M"), variation(12, "L")],
            related: vec![],
            modified: None,
        }
    }

    fn selection(m: i64, l: i64) -> SelectionInput {
        SelectionInput {
            color: "Rojo".to_string(),
            quantities: BTreeMap::from([("M".to_string(), m), ("L".to_string(), l)]),
            zones: vec!["frontal".to_string()],
            printing_method: Some("DTF".to_string()),
            notes: None,
        }
    }

    #[test]
    fn test_build_cart_lines_one_per_size() {
        let product = shirt();
        let input = selection(20, 10);
        let summary = input.summarize(&product);
        let lines = build_cart_lines(&product, &input, &summary).unwrap();

        assert_eq!(lines.len(), 2);
        let calc = summary.calculation.unwrap();
        let expected_unit = round_cents(add_vat(calc.unit_price));
        assert!(lines.iter().all(|l| l.unit_price_with_vat == expected_unit));
        assert!(lines.iter().all(|l| l.product_id == ProductId::new(10)));

        let skus: Vec<_> = lines.iter().filter_map(|l| l.product_sku.as_deref()).collect();
        assert!(skus.contains(&"CAM-R-M"));
        assert_eq!(lines.iter().map(|l| l.quantity).sum::<i32>(), 30);
        let custom = lines[0].customization.as_ref().unwrap();
        assert_eq!(custom.zones, vec!["frontal"]);
        assert_eq!(custom.color.as_deref(), Some("Rojo"));
    }

    #[test]
    fn test_build_cart_lines_rejects_below_minimum() {
        let product = shirt();
        let input = selection(5, 0);
        let summary = input.summarize(&product);
        let err = build_cart_lines(&product, &input, &summary).unwrap_err();
        assert!(err.contains("25"));
    }

    #[test]
    fn test_build_cart_lines_rejects_empty() {
        let product = shirt();
        let input = selection(0, 0);
        let summary = input.summarize(&product);
        assert!(build_cart_lines(&product, &input, &summary).is_err());
    }
}
