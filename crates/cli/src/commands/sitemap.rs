//! Sitemap generation command.
//!
//! Writes the same three files the storefront serves: `sitemap.xml`,
//! `sitemap-pages.xml` and `sitemap-products.xml`.
//!
//! # Environment Variables
//!
//! - `WOOCOMMERCE_GRAPHQL_URL` - WooCommerce GraphQL endpoint

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use impacto33_storefront::catalog::{CatalogClient, CatalogError};
use impacto33_storefront::config::WooCommerceConfig;
use impacto33_storefront::content::{ContentError, ContentStore};
use impacto33_storefront::feeds::sitemap::{
    PAGES_SITEMAP, PRODUCTS_SITEMAP, pages_sitemap, products_sitemap, sitemap_index,
};

/// Errors from the sitemap command.
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn write_file(dir: &Path, name: &str, xml: &str) -> Result<(), SitemapError> {
    let path = dir.join(name);
    std::fs::write(&path, xml).map_err(|source| SitemapError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = xml.len(), "Wrote sitemap");
    Ok(())
}

/// Generate the sitemaps into `out`.
///
/// # Errors
///
/// Returns `SitemapError` if the catalog cannot be read or a file cannot
/// be written.
pub async fn generate(out: &Path, base_url: &str, content_dir: &Path) -> Result<(), SitemapError> {
    let _ = dotenvy::dotenv();

    let graphql_url = std::env::var("WOOCOMMERCE_GRAPHQL_URL")
        .map_err(|_| SitemapError::MissingEnvVar("WOOCOMMERCE_GRAPHQL_URL"))?;
    let base_url = base_url.trim_end_matches('/');

    let content = ContentStore::load(content_dir)?;
    let catalog = CatalogClient::new(&WooCommerceConfig { graphql_url });
    let products = catalog.get_sitemap_products().await?;
    tracing::info!(products = products.len(), "Fetched products for sitemap");

    std::fs::create_dir_all(out).map_err(|source| SitemapError::Write {
        path: out.to_path_buf(),
        source,
    })?;

    write_file(out, "sitemap.xml", &sitemap_index(base_url, Utc::now()))?;
    write_file(out, PAGES_SITEMAP, &pages_sitemap(base_url, &content))?;
    write_file(out, PRODUCTS_SITEMAP, &products_sitemap(base_url, &products))?;
    Ok(())
}
