//! Cache types for catalog responses.

use rust_decimal::Decimal;

use crate::catalog::types::{Category, Product, ProductConnection};

/// Cache key for catalog listings and products.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    CategoryPage {
        slug: String,
        first: i64,
        after: Option<String>,
        min_price: Option<Decimal>,
        max_price: Option<Decimal>,
    },
    Featured(i64),
    Product(String),
    ProductsByIds(Vec<i32>),
    Search { term: String, first: i64 },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<Category>),
    Products(ProductConnection),
    Product(Box<Product>),
}
