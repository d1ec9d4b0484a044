//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Query, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use impacto33_core::ProductId;

use crate::db::WishlistRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::routes::auth::{Flash, MessageQuery};
use crate::routes::layout::PageLayout;
use crate::routes::views::{ProductCard, cards_in_order};
use crate::state::AppState;

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/wishlist.html")]
pub struct WishlistTemplate {
    pub layout: PageLayout,
    pub flash: Flash,
    pub products: Vec<ProductCard>,
    /// Saved products the catalog no longer returns.
    pub missing: usize,
}

/// Heart button fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub product_id: ProductId,
    pub in_wishlist: bool,
}

/// Toggle request.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub product_id: i32,
}

/// Toggle result for JSON clients.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub added: bool,
}

/// Display the wishlist.
#[instrument(skip(state, nonce, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    nonce: CspNonce,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let ids = WishlistRepository::new(state.pool())
        .product_ids(user.id, None)
        .await?;

    let products = if ids.is_empty() {
        Vec::new()
    } else {
        let products = state.catalog().get_products_by_ids(&ids).await?;
        cards_in_order(&ids, &products)
    };

    let unique = {
        let mut seen = std::collections::HashSet::new();
        ids.iter().filter(|id| seen.insert(**id)).count()
    };

    Ok(WishlistTemplate {
        layout: PageLayout::new(nonce, Some("Mis favoritos"))
            .with_user(Some(&user))
            .private(),
        flash: Flash::from(&query),
        missing: unique.saturating_sub(products.len()),
        products,
    })
}

/// Add or remove a product from the wishlist.
///
/// HTMX requests get the updated heart button; other clients get
/// `{"added": bool}`.
#[instrument(skip(state, user, headers), fields(user_id = %user.id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<ToggleForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);
    if !product_id.is_valid() {
        return Err(AppError::BadRequest("Producto no válido".to_string()));
    }

    let added = WishlistRepository::new(state.pool())
        .toggle(user.id, product_id)
        .await?;
    tracing::debug!(%product_id, added, "Wishlist toggled");

    let trigger = AppendHeaders([("HX-Trigger", "wishlist-updated")]);
    if headers.contains_key("HX-Request") {
        Ok((
            trigger,
            WishlistButtonTemplate {
                product_id,
                in_wishlist: added,
            },
        )
            .into_response())
    } else {
        Ok((trigger, Json(ToggleResponse { added })).into_response())
    }
}

/// Remove every product from the wishlist.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let removed = WishlistRepository::new(state.pool()).clear(user.id).await?;
    tracing::info!(removed, "Wishlist cleared");
    Ok(Redirect::to("/mis-favoritos?success=wishlist_cleared").into_response())
}
