//! SEO category pages.
//!
//! Category URLs (`/{cat}/`, `/{cat}/{sub}/`, `/{cat}/{sub}/{child}/`) are
//! not registered one by one: the router fallback looks the path up in the
//! content store and renders the landing text plus a product block fed by
//! WooCommerce. Unknown paths get the 404 page.

use std::fmt::Write as _;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::catalog::PriceFilter;
use crate::content::{SeoCategory, normalize_category_url};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::routes::layout::PageLayout;
use crate::routes::pages::not_found_page;
use crate::routes::views::{ProductCard, cards};
use crate::state::AppState;

/// Largest page the product block will request.
const MAX_BLOCK_LIMIT: i64 = 48;

/// Pagination and price filter query.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub after: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

impl CategoryQuery {
    /// Parse the price bounds; blank or invalid values are ignored and
    /// swapped bounds are put back in order.
    #[must_use]
    pub fn price_filter(&self) -> PriceFilter {
        let parse = |raw: &Option<String>| {
            raw.as_deref()
                .map(|v| v.trim().replace(',', "."))
                .and_then(|v| v.parse::<Decimal>().ok())
                .filter(|v| !v.is_sign_negative())
        };
        let (min_price, max_price) = match (parse(&self.min_price), parse(&self.max_price)) {
            (Some(min), Some(max)) if min > max => (Some(max), Some(min)),
            bounds => bounds,
        };
        PriceFilter {
            min_price,
            max_price,
        }
    }

    fn cursor(&self) -> Option<String> {
        self.after.clone().filter(|c| !c.trim().is_empty())
    }
}

/// Product block of a category page.
#[derive(Debug, Clone, Default)]
pub struct ProductBlock {
    pub products: Vec<ProductCard>,
    pub columns: u8,
    /// Query string for the next page, including the active filters.
    pub next_query: Option<String>,
    pub min_price: String,
    pub max_price: String,
    pub unavailable: bool,
}

/// Category page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryTemplate {
    pub layout: PageLayout,
    pub category: SeoCategory,
    pub path: String,
    pub block: ProductBlock,
}

/// Product grid fragment template (for HTMX "load more").
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridTemplate {
    pub path: String,
    pub block: ProductBlock,
}

fn next_query(cursor: &str, filter: PriceFilter) -> String {
    let mut query = format!("after={}", urlencoding::encode(cursor));
    if let Some(min) = filter.min_price {
        let _ = write!(query, "&min_price={min}");
    }
    if let Some(max) = filter.max_price {
        let _ = write!(query, "&max_price={max}");
    }
    query
}

async fn load_block(state: &AppState, category: &SeoCategory, query: &CategoryQuery) -> ProductBlock {
    let filter = query.price_filter();
    let mut block = ProductBlock {
        columns: category.columns,
        min_price: filter.min_price.map(|p| p.to_string()).unwrap_or_default(),
        max_price: filter.max_price.map(|p| p.to_string()).unwrap_or_default(),
        ..ProductBlock::default()
    };

    let Some(slug) = category.catalog_category_slug.as_deref() else {
        return block;
    };

    match state
        .catalog()
        .get_products_by_category(slug, category.limit.clamp(1, MAX_BLOCK_LIMIT), query.cursor(), filter)
        .await
    {
        Ok(page) => {
            block.products = cards(&page.nodes);
            block.next_query = page
                .page_info
                .end_cursor
                .filter(|_| page.page_info.has_next_page)
                .map(|cursor| next_query(&cursor, filter));
        }
        Err(e) => {
            tracing::error!(error = %e, slug, "Failed to load category products");
            block.unavailable = true;
        }
    }
    block
}

/// Router fallback: SEO category page or 404.
#[instrument(skip(state, nonce, user, headers, query), fields(path = %uri.path()))]
pub async fn category_or_not_found(
    State(state): State<AppState>,
    nonce: CspNonce,
    OptionalAuth(user): OptionalAuth,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<CategoryQuery>,
) -> Response {
    let path = normalize_category_url(uri.path());
    let category = match state.content().get_category(&path) {
        Some(category) if method == Method::GET || method == Method::HEAD => category.clone(),
        _ => return not_found_page(nonce, user.as_ref()),
    };

    let block = load_block(&state, &category, &query).await;

    if headers.contains_key("HX-Request") && query.after.is_some() {
        return ProductGridTemplate { path, block }.into_response();
    }

    let title = if category.meta_title.is_empty() {
        category.heading().to_string()
    } else {
        category.meta_title.clone()
    };

    CategoryTemplate {
        layout: PageLayout::new(nonce, Some(&title))
            .with_description(&category.meta_description)
            .with_user(user.as_ref())
            .with_canonical(state.config().absolute_url(&path)),
        category,
        path,
        block,
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(min: Option<&str>, max: Option<&str>) -> CategoryQuery {
        CategoryQuery {
            after: None,
            min_price: min.map(str::to_string),
            max_price: max.map(str::to_string),
        }
    }

    #[test]
    fn test_price_filter_parsing() {
        let filter = query(Some("5,50"), Some("")).price_filter();
        assert_eq!(filter.min_price, Some(Decimal::new(550, 2)));
        assert_eq!(filter.max_price, None);

        let filter = query(Some("abc"), Some("-3")).price_filter();
        assert_eq!(filter, PriceFilter::default());
    }

    #[test]
    fn test_price_filter_swaps_bounds() {
        let filter = query(Some("20"), Some("10")).price_filter();
        assert_eq!(filter.min_price, Some(Decimal::from(10)));
        assert_eq!(filter.max_price, Some(Decimal::from(20)));
    }

    #[test]
    fn test_next_query_keeps_filters() {
        let filter = PriceFilter {
            min_price: Some(Decimal::from(5)),
            max_price: None,
        };
        assert_eq!(next_query("YXJyYXk=:12", filter), "after=YXJyYXk%3D%3A12&min_price=5");
    }
}
