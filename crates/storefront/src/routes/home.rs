//! Landing and home page handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::routes::layout::PageLayout;
use crate::routes::views::{CategoryCard, ProductCard, cards};
use crate::state::AppState;

/// Products in the home page grid.
const FEATURED_PRODUCTS: i64 = 8;

/// Products teased on the landing page.
const LANDING_PRODUCTS: usize = 4;

/// Service link on the landing page.
#[derive(Debug, Clone)]
pub struct ServiceLink {
    pub title: String,
    pub description: String,
    pub url: String,
}

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "landing.html")]
pub struct LandingTemplate {
    pub layout: PageLayout,
    pub services: Vec<ServiceLink>,
    pub products: Vec<ProductCard>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: PageLayout,
    pub featured: Vec<ProductCard>,
    pub categories: Vec<CategoryCard>,
}

async fn featured_cards(state: &AppState) -> Vec<ProductCard> {
    state
        .catalog()
        .get_featured_products(FEATURED_PRODUCTS)
        .await
        .map_or_else(
            |e| {
                tracing::error!("Failed to fetch featured products: {e}");
                Vec::new()
            },
            |products| cards(&products),
        )
}

/// Display the landing page.
#[instrument(skip(state, nonce, user))]
pub async fn landing(
    State(state): State<AppState>,
    nonce: CspNonce,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let services = state
        .content()
        .services()
        .into_iter()
        .map(|page| ServiceLink {
            title: page.meta.title.clone(),
            description: page.meta.description.clone().unwrap_or_default(),
            url: format!("/servicios/{}", page.slug),
        })
        .collect();

    let mut products = featured_cards(&state).await;
    products.truncate(LANDING_PRODUCTS);

    LandingTemplate {
        layout: PageLayout::new(nonce, None)
            .with_user(user.as_ref())
            .with_canonical(state.config().absolute_url("/")),
        services,
        products,
    }
}

/// Display the home page: featured products and top-level categories.
#[instrument(skip(state, nonce, user))]
pub async fn home(
    State(state): State<AppState>,
    nonce: CspNonce,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let (featured, categories) = tokio::join!(featured_cards(&state), state.catalog().get_categories());

    let categories = categories.map_or_else(
        |e| {
            tracing::error!("Failed to fetch categories: {e}");
            Vec::new()
        },
        |categories| {
            categories
                .iter()
                .filter(|c| c.is_top_level() && c.count.unwrap_or(0) > 0)
                .map(CategoryCard::from)
                .collect()
        },
    );

    HomeTemplate {
        layout: PageLayout::new(nonce, Some("Inicio")).with_user(user.as_ref()),
        featured,
        categories,
    }
}
