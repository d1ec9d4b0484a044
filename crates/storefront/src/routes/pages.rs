//! Content page route handlers.
//!
//! Info pages and service pages are markdown files with YAML frontmatter,
//! loaded into the `ContentStore` at startup.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use tracing::instrument;

use crate::content::Page;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::models::CurrentUser;
use crate::routes::layout::PageLayout;
use crate::state::AppState;

/// Info pages served from `content/pages`, by URL path.
pub const INFO_PAGES: &[&str] = &[
    "/contacto",
    "/quienes-somos",
    "/plazos-de-entrega",
    "/enviar-archivos",
    "/formas-de-pago",
    "/tarifa-portes",
    "/precios",
    "/garantia-de-calidad",
    "/trabajos-realizados",
    "/marcas",
    "/condiciones-generales",
    "/politica-privacidad",
    "/cookies",
    "/aviso-legal",
];

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub layout: PageLayout,
    pub heading: String,
    pub updated_at: Option<NaiveDate>,
    pub image: Option<String>,
    pub content_html: String,
    /// Set on service pages to show the quote call to action.
    pub is_service: bool,
}

/// Not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/not_found.html")]
pub struct NotFoundTemplate {
    pub layout: PageLayout,
}

/// Render the 404 page.
#[must_use]
pub fn not_found_page(nonce: CspNonce, user: Option<&CurrentUser>) -> Response {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            layout: PageLayout::new(nonce, Some("Página no encontrada"))
                .with_user(user)
                .private(),
        },
    )
        .into_response()
}

fn render_page(
    state: &AppState,
    page: &Page,
    path: &str,
    nonce: CspNonce,
    user: Option<&CurrentUser>,
    is_service: bool,
) -> Response {
    ContentPageTemplate {
        layout: PageLayout::new(nonce, Some(&page.meta.title))
            .with_description(page.meta.description.as_deref().unwrap_or_default())
            .with_user(user)
            .with_canonical(state.config().absolute_url(path)),
        heading: page.meta.title.clone(),
        updated_at: page.meta.updated_at,
        image: page.meta.image.clone(),
        content_html: page.content_html.clone(),
        is_service,
    }
    .into_response()
}

/// Display an info page. The slug is the request path without the slash.
#[instrument(skip(state, nonce, user))]
pub async fn info_page(
    State(state): State<AppState>,
    nonce: CspNonce,
    OptionalAuth(user): OptionalAuth,
    uri: Uri,
) -> Response {
    let path = uri.path().trim_end_matches('/');
    let slug = path.trim_start_matches('/');
    match state.content().get_page(slug) {
        Some(page) => render_page(&state, page, path, nonce, user.as_ref(), false),
        None => {
            tracing::warn!(slug, "Info page has no content file");
            not_found_page(nonce, user.as_ref())
        }
    }
}

/// Display a service page.
#[instrument(skip(state, nonce, user))]
pub async fn service(
    State(state): State<AppState>,
    nonce: CspNonce,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
) -> Response {
    match state.content().get_service(&slug) {
        Some(page) => {
            let path = format!("/servicios/{slug}");
            render_page(&state, page, &path, nonce, user.as_ref(), true)
        }
        None => not_found_page(nonce, user.as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_pages_are_in_the_sitemap() {
        for page in INFO_PAGES {
            assert!(
                crate::feeds::sitemap::STATIC_ROUTES.contains(page),
                "{page} missing from sitemap"
            );
        }
    }
}
