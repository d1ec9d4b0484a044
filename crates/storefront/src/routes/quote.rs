//! Quote request handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;

use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::routes::layout::PageLayout;
use crate::services::quote::QuoteRequest;
use crate::state::AppState;

const SENT_MESSAGE: &str = "Solicitud enviada. Te contactaremos en menos de 24 horas laborables.";
const EMAIL_DISABLED_MESSAGE: &str =
    "El envío de presupuestos no está disponible ahora mismo. Escríbenos por WhatsApp o email.";
const SEND_FAILED_MESSAGE: &str = "No se pudo enviar la solicitud. Inténtalo de nuevo más tarde.";

/// Body of `POST /api/quote`.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub success: bool,
    pub message: String,
}

impl QuoteResponse {
    fn reply(status: StatusCode, success: bool, message: impl Into<String>) -> Response {
        (
            status,
            Json(Self {
                success,
                message: message.into(),
            }),
        )
            .into_response()
    }
}

/// Quick quote page template.
#[derive(Template, WebTemplate)]
#[template(path = "quote/index.html")]
pub struct QuotePageTemplate {
    pub layout: PageLayout,
    pub email_enabled: bool,
}

/// Display the quick quote page.
#[instrument(skip(state, nonce, user))]
pub async fn quote_page(
    State(state): State<AppState>,
    nonce: CspNonce,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    QuotePageTemplate {
        layout: PageLayout::new(nonce, Some("Presupuesto rápido"))
            .with_description("Pide presupuesto de merchandising personalizado en menos de un minuto.")
            .with_user(user.as_ref())
            .with_canonical(state.config().absolute_url("/presupuesto-rapido")),
        email_enabled: state.email().is_some(),
    }
}

/// Validate a quote request and email it to the customer and to sales.
#[instrument(skip(state, request), fields(product = %request.product.name))]
pub async fn submit(State(state): State<AppState>, Json(request): Json<QuoteRequest>) -> Response {
    let Some(email) = state.email() else {
        return QuoteResponse::reply(StatusCode::SERVICE_UNAVAILABLE, false, EMAIL_DISABLED_MESSAGE);
    };

    let quote = match request.validate() {
        Ok(quote) => quote,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected quote request");
            return QuoteResponse::reply(StatusCode::BAD_REQUEST, false, e.to_string());
        }
    };

    match email.send_quote(&quote).await {
        Ok(()) => {
            tracing::info!(
                product = %quote.product_name,
                units = quote.total_quantity,
                "Quote request sent"
            );
            QuoteResponse::reply(StatusCode::OK, true, SENT_MESSAGE)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to send quote emails");
            QuoteResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, false, SEND_FAILED_MESSAGE)
        }
    }
}
