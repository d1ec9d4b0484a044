//! Order history route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use impacto33_core::OrderId;

use crate::db::{DEFAULT_ORDER_LIMIT, OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::models::{Customization, OrderItem};
use crate::pricing::{format_euro, zone_label};
use crate::routes::account::OrderRow;
use crate::routes::auth::{Flash, MessageQuery};
use crate::routes::layout::PageLayout;
use crate::state::AppState;

/// Order line for the detail page.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub name: String,
    pub sku: Option<String>,
    pub image: Option<String>,
    pub variation: String,
    pub customization: String,
    pub quantity: i32,
    pub unit_price: String,
    pub total: String,
}

/// Readable summary of the personalisation of a line.
#[must_use]
pub fn customization_summary(customization: Option<&Customization>) -> String {
    let Some(custom) = customization.filter(|c| !c.is_empty()) else {
        return String::new();
    };
    let mut parts = Vec::new();
    if !custom.zones.is_empty() {
        let zones: Vec<&str> = custom.zones.iter().map(|z| zone_label(z)).collect();
        parts.push(format!("Zonas: {}", zones.join(", ")));
    }
    if let Some(method) = &custom.printing_method {
        parts.push(format!("Técnica: {method}"));
    }
    if let Some(notes) = &custom.notes {
        parts.push(notes.clone());
    }
    parts.join(" · ")
}

fn variation_label(attributes: &serde_json::Value) -> String {
    attributes
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

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            name: item.product_name.clone(),
            sku: item.product_sku.clone(),
            image: item.product_image.clone(),
            variation: variation_label(&item.variation_attributes),
            customization: customization_summary(item.customization.as_ref()),
            quantity: item.quantity,
            unit_price: format_euro(item.unit_price_with_vat),
            total: format_euro(item.total_price_with_vat),
        }
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: PageLayout,
    pub flash: Flash,
    pub orders: Vec<OrderRow>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order_detail.html")]
pub struct OrderDetailTemplate {
    pub layout: PageLayout,
    pub flash: Flash,
    pub order: OrderRow,
    pub can_repeat: bool,
    pub items: Vec<OrderItemView>,
    pub subtotal: String,
    pub vat_amount: String,
    pub total: String,
    pub notes: Option<String>,
}

fn parse_order_id(raw: &str) -> Result<OrderId> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Pedido no encontrado".to_string()))
}

/// Display the order history.
#[instrument(skip(state, nonce, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    nonce: CspNonce,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id, DEFAULT_ORDER_LIMIT)
        .await?;

    Ok(OrdersTemplate {
        layout: PageLayout::new(nonce, Some("Mis pedidos"))
            .with_user(Some(&user))
            .private(),
        flash: Flash::from(&query),
        orders: orders.iter().map(OrderRow::from).collect(),
    })
}

/// Display one order.
#[instrument(skip(state, nonce, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    nonce: CspNonce,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let order_id = parse_order_id(&id)?;
    let details = OrderRepository::new(state.pool())
        .get_details(user.id, order_id)
        .await?;

    let row = OrderRow::from(&crate::models::OrderSummary {
        items_count: i64::try_from(details.items.len()).unwrap_or(i64::MAX),
        order: details.order.clone(),
    });
    let title = format!("Pedido {}", details.order.order_number);

    Ok(OrderDetailTemplate {
        layout: PageLayout::new(nonce, Some(&title))
            .with_user(Some(&user))
            .private(),
        flash: Flash::from(&query),
        can_repeat: !details.items.is_empty(),
        items: details.items.iter().map(OrderItemView::from).collect(),
        subtotal: format_euro(details.order.subtotal),
        vat_amount: format_euro(details.order.vat_amount),
        total: format_euro(details.order.total),
        notes: details.order.notes.clone(),
        order: row,
    })
}

/// Copy an order's lines into the cart and open the cart.
///
/// HTMX requests get an `HX-Redirect` so the whole page navigates.
#[instrument(skip(state, user, headers), fields(user_id = %user.id))]
pub async fn repeat(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let order_id = parse_order_id(&id)?;
    match OrderRepository::new(state.pool())
        .repeat_order(user.id, order_id)
        .await
    {
        Ok((_, lines)) => {
            tracing::info!(lines, "Order repeated");
            let target = "/carrito?success=order_repeated";
            if headers.contains_key("HX-Request") {
                Ok(([("HX-Redirect", target)], "").into_response())
            } else {
                Ok(Redirect::to(target).into_response())
            }
        }
        Err(RepositoryError::Invalid(_)) => {
            Ok(Redirect::to(&format!("/mis-pedidos/{order_id}?error=order_empty")).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
