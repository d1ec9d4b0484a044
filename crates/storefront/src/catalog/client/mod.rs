//! WooCommerce GraphQL client implementation.
//!
//! Uses `graphql_client` request/response types with `reqwest` 0.13 for HTTP.
//! Caches categories, listings and products using `moka` (5-minute TTL).

mod cache;
mod conversions;
pub mod queries;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use impacto33_core::ProductId;
use moka::future::Cache;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, instrument, warn};

use crate::catalog::types::{Category, Product, ProductConnection, ProductVariation, SitemapProduct};
use crate::catalog::{CatalogError, GraphQLError};
use crate::config::WooCommerceConfig;

use cache::{CacheKey, CacheValue};
use conversions::{
    convert_category, convert_product, convert_product_connection, convert_sitemap_product,
    convert_variation,
};
use queries::{
    GetFeaturedProducts, GetFeedProducts, GetProductBySlug, GetProductCategories,
    GetProductVariations, GetProductsByCategory, GetProductsByIds, GetSitemapProducts, Ping,
    SearchProducts, get_featured_products, get_feed_products, get_product_by_slug,
    get_product_categories, get_product_variations, get_products_by_category,
    get_products_by_ids, get_sitemap_products, ping, search_products,
};

/// Page size used when walking the whole catalog.
const BULK_PAGE_SIZE: i64 = 100;

/// Upper bound on pages walked in one bulk listing.
const MAX_BULK_PAGES: usize = 200;

/// Optional price bounds for category listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceFilter {
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the WooCommerce catalog.
///
/// Provides typed access to categories and products. Listings and products
/// are cached for 5 minutes; bulk feed/sitemap walks bypass the cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    endpoint: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &WooCommerceConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            inner: Arc::new(CatalogClientInner {
                client,
                endpoint: config.graphql_url.clone(),
                cache,
            }),
        }
    }

    /// Drop every cached response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }

    /// Execute a GraphQL query.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, CatalogError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "WooCommerce GraphQL returned non-success status"
            );
            return Err(CatalogError::message(format!(
                "HTTP {status}: {}",
                truncate(&response_text, 200)
            )));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = request_body.operation_name,
                    body = %truncate(&response_text, 500),
                    "Failed to parse WooCommerce GraphQL response"
                );
                return Err(CatalogError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(CatalogError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "WooCommerce GraphQL response has no data and no errors"
            );
            CatalogError::message("No data in response")
        })
    }

    /// Round-trip a trivial query to check connectivity.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is unreachable or not a GraphQL server.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), CatalogError> {
        let data = self.execute::<Ping>(ping::Variables).await?;
        debug!(typename = ?data.typename, "GraphQL endpoint reachable");
        Ok(())
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// Get the category tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<Category>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let data = self
            .execute::<GetProductCategories>(get_product_categories::Variables)
            .await?;

        let categories: Vec<Category> = queries::nodes(data.product_categories)
            .into_iter()
            .filter_map(convert_category)
            .collect();

        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get one page of products in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_products_by_category(
        &self,
        slug: &str,
        first: i64,
        after: Option<String>,
        filter: PriceFilter,
    ) -> Result<ProductConnection, CatalogError> {
        let cache_key = CacheKey::CategoryPage {
            slug: slug.to_string(),
            first,
            after: after.clone(),
            min_price: filter.min_price,
            max_price: filter.max_price,
        };

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category page");
            return Ok(page);
        }

        let variables = get_products_by_category::Variables {
            category_slug: slug.to_string(),
            first,
            after,
            min_price: filter.min_price.and_then(|p| p.to_f64()),
            max_price: filter.max_price.and_then(|p| p.to_f64()),
        };

        let data = self.execute::<GetProductsByCategory>(variables).await?;
        let page = convert_product_connection(data.products);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    /// Get featured products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_featured_products(&self, first: i64) -> Result<Vec<Product>, CatalogError> {
        let cache_key = CacheKey::Featured(first);

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for featured products");
            return Ok(page.nodes);
        }

        let data = self
            .execute::<GetFeaturedProducts>(get_featured_products::Variables { first })
            .await?;
        let page = convert_product_connection(data.products);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page.nodes)
    }

    /// Get a product with variations and related products by its slug.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this slug, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product, CatalogError> {
        let cache_key = CacheKey::Product(slug.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let variables = get_product_by_slug::Variables {
            slug: slug.to_string(),
        };

        let data = self.execute::<GetProductBySlug>(variables).await?;

        let product = data
            .product
            .and_then(convert_product)
            .ok_or_else(|| CatalogError::NotFound(format!("Product not found: {slug}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get products by id, in the order requested.
    ///
    /// Duplicate ids are collapsed and ids WooCommerce does not return are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn get_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, CatalogError> {
        let ordered = unique_valid_ids(ids);
        if ordered.is_empty() {
            return Ok(Vec::new());
        }

        let cache_key = CacheKey::ProductsByIds(ordered.clone());
        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products by ids");
            return Ok(page.nodes);
        }

        let variables = get_products_by_ids::Variables {
            ids: ordered.clone(),
            first: i64::try_from(ordered.len()).unwrap_or(BULK_PAGE_SIZE),
        };
        let data = self.execute::<GetProductsByIds>(variables).await?;
        let page = convert_product_connection(data.products);
        let products = order_by_ids(&ordered, page.nodes);

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Products(ProductConnection {
                    nodes: products.clone(),
                    page_info: page.page_info,
                }),
            )
            .await;

        Ok(products)
    }

    /// Full-text product search.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(term = %term))]
    pub async fn search_products(&self, term: &str, first: i64) -> Result<Vec<Product>, CatalogError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let cache_key = CacheKey::Search {
            term: term.to_lowercase(),
            first,
        };
        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for search");
            return Ok(page.nodes);
        }

        let variables = search_products::Variables {
            search: term.to_string(),
            first,
        };
        let data = self.execute::<SearchProducts>(variables).await?;
        let page = convert_product_connection(data.products);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page.nodes)
    }

    // =========================================================================
    // Bulk listings (feed & sitemap)
    // =========================================================================

    /// Walk every published product for the merchant feed.
    ///
    /// A failing page stops the walk; the products fetched so far are returned.
    #[instrument(skip(self))]
    pub async fn get_all_products_for_feed(&self) -> Vec<Product> {
        let mut products = Vec::new();
        let mut after = None;

        for page_number in 1..=MAX_BULK_PAGES {
            let variables = get_feed_products::Variables {
                first: BULK_PAGE_SIZE,
                after: after.clone(),
            };

            let page = match self.execute::<GetFeedProducts>(variables).await {
                Ok(data) => convert_product_connection(data.products),
                Err(e) => {
                    warn!(error = %e, page = page_number, fetched = products.len(), "Feed pagination stopped");
                    break;
                }
            };

            products.extend(page.nodes);

            match PageInfoNext::from(page.page_info) {
                PageInfoNext::More(cursor) => after = Some(cursor),
                PageInfoNext::Done => break,
            }
        }

        debug!(count = products.len(), "Fetched products for feed");
        products
    }

    /// Variations of one variable product. Failures yield an empty list.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product_variations(&self, id: ProductId) -> Vec<ProductVariation> {
        let variables = get_product_variations::Variables {
            id: id.to_string(),
        };

        match self.execute::<GetProductVariations>(variables).await {
            Ok(data) => data
                .product
                .map(|p| queries::nodes(p.variations))
                .unwrap_or_default()
                .into_iter()
                .map(convert_variation)
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to fetch product variations");
                Vec::new()
            }
        }
    }

    /// Walk every published product's slug, modification date and image.
    ///
    /// # Errors
    ///
    /// Returns an error if the first page cannot be fetched; later page
    /// failures end the walk early.
    #[instrument(skip(self))]
    pub async fn get_sitemap_products(&self) -> Result<Vec<SitemapProduct>, CatalogError> {
        let mut products = Vec::new();
        let mut after = None;

        for page_number in 1..=MAX_BULK_PAGES {
            let variables = get_sitemap_products::Variables {
                first: BULK_PAGE_SIZE,
                after: after.clone(),
            };

            let raw = match self.execute::<GetSitemapProducts>(variables).await {
                Ok(data) => data.products.unwrap_or_default(),
                Err(e) if page_number == 1 => return Err(e),
                Err(e) => {
                    warn!(error = %e, page = page_number, "Sitemap pagination stopped");
                    break;
                }
            };

            let page_info = raw.page_info.unwrap_or_default();
            products.extend(raw.nodes.into_iter().filter_map(convert_sitemap_product));

            match (page_info.has_next_page, page_info.end_cursor) {
                (true, Some(cursor)) => after = Some(cursor),
                _ => break,
            }
        }

        Ok(products)
    }
}

/// Whether a bulk walk should continue.
enum PageInfoNext {
    More(String),
    Done,
}

impl From<crate::catalog::types::PageInfo> for PageInfoNext {
    fn from(info: crate::catalog::types::PageInfo) -> Self {
        match (info.has_next_page, info.end_cursor) {
            (true, Some(cursor)) => Self::More(cursor),
            _ => Self::Done,
        }
    }
}

/// Positive ids in first-seen order, without duplicates.
fn unique_valid_ids(ids: &[ProductId]) -> Vec<i32> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| id.is_valid())
        .map(|id| id.into_inner())
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Reorder products to match `ids`, dropping ids with no product.
fn order_by_ids(ids: &[i32], products: Vec<Product>) -> Vec<Product> {
    let mut by_id: HashMap<i32, Product> = products
        .into_iter()
        .map(|p| (p.id.into_inner(), p))
        .collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
