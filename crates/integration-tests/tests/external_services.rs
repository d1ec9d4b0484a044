//! Live connectivity checks against the external backends.
//!
//! These tests require:
//! - `WOOCOMMERCE_GRAPHQL_URL` pointing at a WPGraphQL endpoint
//! - `SUPABASE_URL` and `SUPABASE_ANON_KEY` for the Supabase project

use impacto33_storefront::catalog::CatalogClient;
use impacto33_storefront::config::{SupabaseConfig, WooCommerceConfig};
use impacto33_storefront::services::auth::SupabaseAuthClient;
use secrecy::SecretString;

fn env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set"))
}

#[tokio::test]
#[ignore = "Requires WooCommerce GraphQL endpoint"]
async fn test_graphql_connectivity() {
    let client = CatalogClient::new(&WooCommerceConfig {
        graphql_url: env("WOOCOMMERCE_GRAPHQL_URL"),
    });
    client.ping().await.unwrap();
}

#[tokio::test]
#[ignore = "Requires WooCommerce GraphQL endpoint"]
async fn test_graphql_categories() {
    let client = CatalogClient::new(&WooCommerceConfig {
        graphql_url: env("WOOCOMMERCE_GRAPHQL_URL"),
    });
    let categories = client.get_categories().await.unwrap();
    assert!(categories.iter().all(|c| !c.slug.is_empty()));
}

#[tokio::test]
#[ignore = "Requires Supabase project credentials"]
async fn test_supabase_reachability() {
    let client = SupabaseAuthClient::new(&SupabaseConfig {
        url: env("SUPABASE_URL"),
        anon_key: SecretString::from(env("SUPABASE_ANON_KEY")),
    });
    client.health().await.unwrap();
}
