//! GraphQL operations against WPGraphQL for WooCommerce.
//!
//! There is no introspection schema checked in for the shop, so each operation
//! implements [`GraphQLQuery`] directly over a `.graphql` document and a
//! hand-written response shape. Every response field is optional; the
//! conversions decide which ones are required.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

const CATEGORIES_DOCUMENT: &str = include_str!("../../../graphql/woocommerce/categories.graphql");
const PRODUCTS_DOCUMENT: &str = include_str!("../../../graphql/woocommerce/products.graphql");
const FEED_DOCUMENT: &str = include_str!("../../../graphql/woocommerce/feed.graphql");

macro_rules! woo_query {
    ($(#[$meta:meta])* $name:ident, $module:ident, $document:expr) => {
        $(#[$meta])*
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $document,
                    operation_name: stringify!($name),
                }
            }
        }
    };
}

// =============================================================================
// Shared response shapes
// =============================================================================

/// `{ nodes: [...] }` connection wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct Nodes<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

/// `{ node: {...} }` edge wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeRef<T> {
    pub node: Option<T>,
}

/// Flatten an optional connection into its nodes.
pub fn nodes<T>(connection: Option<Nodes<T>>) -> Vec<T> {
    connection.map(|c| c.nodes).unwrap_or_default()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawImage {
    pub source_url: Option<String>,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSlug {
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCategory {
    pub id: String,
    pub database_id: i32,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub count: Option<i32>,
    pub image: Option<RawImage>,
    pub parent: Option<NodeRef<RawSlug>>,
    pub children: Option<Nodes<RawCategory>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCategoryRef {
    pub database_id: i32,
    pub name: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAttribute {
    pub name: Option<String>,
    pub label: Option<String>,
    pub options: Option<Vec<String>>,
    pub variation: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawVariationAttribute {
    pub name: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawVariation {
    pub id: String,
    pub database_id: i32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<String>,
    pub regular_price: Option<String>,
    pub sale_price: Option<String>,
    pub stock_status: Option<String>,
    pub stock_quantity: Option<i32>,
    pub image: Option<RawImage>,
    pub attributes: Option<Nodes<RawVariationAttribute>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProduct {
    pub id: String,
    pub database_id: i32,
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub featured: Option<bool>,
    pub modified: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<String>,
    pub regular_price: Option<String>,
    pub sale_price: Option<String>,
    pub stock_status: Option<String>,
    pub stock_quantity: Option<i32>,
    pub image: Option<RawImage>,
    pub product_categories: Option<Nodes<RawCategoryRef>>,
    pub gallery_images: Option<Nodes<RawImage>>,
    pub attributes: Option<Nodes<RawAttribute>>,
    pub variations: Option<Nodes<RawVariation>>,
    pub related: Option<Nodes<RawProduct>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProductConnection {
    pub page_info: Option<RawPageInfo>,
    pub nodes: Vec<RawProduct>,
}

// =============================================================================
// Categories
// =============================================================================

pub mod get_product_categories {
    use super::{Deserialize, Nodes, RawCategory, Serialize};

    #[derive(Debug, Serialize)]
    pub struct Variables;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub product_categories: Option<Nodes<RawCategory>>,
    }
}

woo_query!(
    /// Category tree (first 100 with children).
    GetProductCategories,
    get_product_categories,
    CATEGORIES_DOCUMENT
);

pub mod ping {
    use super::{Deserialize, Serialize};

    #[derive(Debug, Serialize)]
    pub struct Variables;

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        #[serde(rename = "__typename")]
        pub typename: Option<String>,
    }
}

woo_query!(
    /// Cheapest possible round trip, used by connectivity checks.
    Ping,
    ping,
    CATEGORIES_DOCUMENT
);

// =============================================================================
// Products
// =============================================================================

pub mod get_products_by_category {
    use super::{Deserialize, RawProductConnection, Serialize};

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub category_slug: String,
        pub first: i64,
        pub after: Option<String>,
        pub min_price: Option<f64>,
        pub max_price: Option<f64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub products: Option<RawProductConnection>,
    }
}

woo_query!(
    GetProductsByCategory,
    get_products_by_category,
    PRODUCTS_DOCUMENT
);

pub mod get_featured_products {
    use super::{Deserialize, RawProductConnection, Serialize};

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub products: Option<RawProductConnection>,
    }
}

woo_query!(GetFeaturedProducts, get_featured_products, PRODUCTS_DOCUMENT);

pub mod get_products_by_ids {
    use super::{Deserialize, RawProductConnection, Serialize};

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub ids: Vec<i32>,
        pub first: i64,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub products: Option<RawProductConnection>,
    }
}

woo_query!(GetProductsByIds, get_products_by_ids, PRODUCTS_DOCUMENT);

pub mod search_products {
    use super::{Deserialize, RawProductConnection, Serialize};

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub search: String,
        pub first: i64,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub products: Option<RawProductConnection>,
    }
}

woo_query!(SearchProducts, search_products, PRODUCTS_DOCUMENT);

pub mod get_product_by_slug {
    use super::{Deserialize, RawProduct, Serialize};

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub slug: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub product: Option<RawProduct>,
    }
}

woo_query!(
    /// Full product detail with variations and related products.
    GetProductBySlug,
    get_product_by_slug,
    PRODUCTS_DOCUMENT
);

// =============================================================================
// Feed & sitemap
// =============================================================================

pub mod get_feed_products {
    use super::{Deserialize, RawProductConnection, Serialize};

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub products: Option<RawProductConnection>,
    }
}

woo_query!(GetFeedProducts, get_feed_products, FEED_DOCUMENT);

pub mod get_product_variations {
    use super::{Deserialize, Nodes, RawVariation, Serialize};

    #[derive(Debug, Serialize)]
    pub struct Variables {
        /// Product `databaseId` as a string (`ID!` scalar).
        pub id: String,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct VariableProduct {
        pub variations: Option<Nodes<RawVariation>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub product: Option<VariableProduct>,
    }
}

woo_query!(GetProductVariations, get_product_variations, FEED_DOCUMENT);

pub mod get_sitemap_products {
    use super::{Deserialize, RawProductConnection, Serialize};

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub products: Option<RawProductConnection>,
    }
}

woo_query!(GetSitemapProducts, get_sitemap_products, FEED_DOCUMENT);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_selects_operation() {
        let body = GetFeaturedProducts::build_query(get_featured_products::Variables { first: 8 });
        assert_eq!(body.operation_name, "GetFeaturedProducts");
        assert!(body.query.contains("query GetFeaturedProducts"));

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["variables"]["first"], 8);
        assert_eq!(json["operationName"], "GetFeaturedProducts");
    }

    #[test]
    fn test_category_variables_are_camel_case() {
        let vars = get_products_by_category::Variables {
            category_slug: "t_shirts".to_string(),
            first: 12,
            after: None,
            min_price: Some(5.0),
            max_price: None,
        };
        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(json["categorySlug"], "t_shirts");
        assert_eq!(json["minPrice"], 5.0);
        assert!(json["maxPrice"].is_null());
    }

    #[test]
    fn test_raw_product_tolerates_missing_fields() {
        let raw: RawProduct = serde_json::from_str(
            r#"{"id":"cHJvZHVjdDox","databaseId":1,"name":"Taza","price":"3,20&nbsp;€","image":null}"#,
        )
        .unwrap();
        assert_eq!(raw.database_id, 1);
        assert_eq!(raw.price.as_deref(), Some("3,20&nbsp;€"));
        assert!(raw.variations.is_none());
    }
}
