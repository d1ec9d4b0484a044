//! Conversions from raw WPGraphQL shapes to catalog domain types.

use impacto33_core::{ProductId, VariationId};

use crate::catalog::types::{
    Category, CategoryRef, Image, PageInfo, Product, ProductAttribute, ProductConnection,
    ProductType, ProductVariation, SitemapProduct, StockStatus, VariationAttribute, parse_price,
};

use super::queries::{
    RawCategory, RawImage, RawProduct, RawProductConnection, RawVariation, nodes,
};

pub fn convert_image(raw: RawImage) -> Option<Image> {
    let url = raw.source_url.filter(|u| !u.is_empty())?;
    Some(Image {
        url,
        alt_text: raw.alt_text.filter(|a| !a.is_empty()),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn convert_category(raw: RawCategory) -> Option<Category> {
    let slug = non_empty(raw.slug)?;
    Some(Category {
        id: raw.id,
        database_id: raw.database_id,
        name: raw.name.unwrap_or_else(|| slug.clone()),
        slug,
        count: raw.count,
        image: raw.image.and_then(convert_image),
        parent_slug: raw
            .parent
            .and_then(|p| p.node)
            .and_then(|n| non_empty(n.slug)),
        children: nodes(raw.children)
            .into_iter()
            .filter_map(convert_category)
            .collect(),
    })
}

pub fn convert_variation(raw: RawVariation) -> ProductVariation {
    ProductVariation {
        id: VariationId::new(raw.database_id),
        name: raw.name.unwrap_or_default(),
        description: non_empty(raw.description),
        sku: non_empty(raw.sku),
        price: raw.price.as_deref().and_then(parse_price),
        regular_price: raw.regular_price.as_deref().and_then(parse_price),
        sale_price: raw.sale_price.as_deref().and_then(parse_price),
        stock_status: StockStatus::from_graphql(raw.stock_status.as_deref()),
        stock_quantity: raw.stock_quantity,
        image: raw.image.and_then(convert_image),
        attributes: nodes(raw.attributes)
            .into_iter()
            .filter_map(|attr| {
                Some(VariationAttribute {
                    name: attr.name?,
                    value: attr.value.unwrap_or_default(),
                })
            })
            .collect(),
    }
}

/// Convert a product node. Nodes without a slug cannot be linked and are dropped.
pub fn convert_product(raw: RawProduct) -> Option<Product> {
    let slug = non_empty(raw.slug)?;
    Some(Product {
        id: ProductId::new(raw.database_id),
        global_id: raw.id,
        name: raw.name.unwrap_or_else(|| slug.clone()),
        slug,
        sku: non_empty(raw.sku),
        product_type: ProductType::from_graphql(raw.product_type.as_deref()),
        featured: raw.featured.unwrap_or(false),
        description: non_empty(raw.description),
        short_description: non_empty(raw.short_description),
        price: raw.price.as_deref().and_then(parse_price),
        regular_price: raw.regular_price.as_deref().and_then(parse_price),
        sale_price: raw.sale_price.as_deref().and_then(parse_price),
        stock_status: StockStatus::from_graphql(raw.stock_status.as_deref()),
        stock_quantity: raw.stock_quantity,
        image: raw.image.and_then(convert_image),
        gallery: nodes(raw.gallery_images)
            .into_iter()
            .filter_map(convert_image)
            .collect(),
        categories: nodes(raw.product_categories)
            .into_iter()
            .filter_map(|c| {
                Some(CategoryRef {
                    database_id: c.database_id,
                    slug: non_empty(c.slug)?,
                    name: c.name.unwrap_or_default(),
                })
            })
            .collect(),
        attributes: nodes(raw.attributes)
            .into_iter()
            .filter_map(|a| {
                Some(ProductAttribute {
                    name: a.name?,
                    label: a.label,
                    options: a.options.unwrap_or_default(),
                    variation: a.variation.unwrap_or(false),
                })
            })
            .collect(),
        variations: nodes(raw.variations)
            .into_iter()
            .map(convert_variation)
            .collect(),
        related: nodes(raw.related)
            .into_iter()
            .filter_map(convert_product)
            .collect(),
        modified: raw.modified,
    })
}

pub fn convert_product_connection(raw: Option<RawProductConnection>) -> ProductConnection {
    let raw = raw.unwrap_or_default();
    let page_info = raw.page_info.unwrap_or_default();
    ProductConnection {
        nodes: raw.nodes.into_iter().filter_map(convert_product).collect(),
        page_info: PageInfo {
            has_next_page: page_info.has_next_page,
            end_cursor: page_info.end_cursor,
        },
    }
}

pub fn convert_sitemap_product(raw: RawProduct) -> Option<SitemapProduct> {
    Some(SitemapProduct {
        slug: non_empty(raw.slug)?,
        modified: raw.modified,
        image_url: raw.image.and_then(|i| i.source_url).filter(|u| !u.is_empty()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_product_parses_prices_and_categories() {
        let raw: RawProduct = serde_json::from_value(serde_json::json!({
            "id": "cHJvZHVjdDo0Mg==",
            "databaseId": 42,
            "name": "Camiseta Básica",
            "slug": "camiseta-basica",
            "type": "VARIABLE",
            "price": "3,50&nbsp;€ - 4,20&nbsp;€",
            "regularPrice": "4,20&nbsp;€",
            "salePrice": null,
            "stockStatus": "IN_STOCK",
            "image": { "sourceUrl": "https://tienda.test/camiseta.jpg", "altText": "" },
            "productCategories": { "nodes": [{ "databaseId": 7, "name": "Camisetas", "slug": "t_shirts" }] },
            "variations": { "nodes": [{
                "id": "v1", "databaseId": 43, "name": "Camiseta - Rojo - M",
                "stockQuantity": null, "stockStatus": "IN_STOCK",
                "attributes": { "nodes": [{ "name": "pa_color", "value": "rojo" }] }
            }] }
        }))
        .unwrap();

        let product = convert_product(raw).unwrap();
        assert_eq!(product.id, ProductId::new(42));
        assert_eq!(product.product_type, ProductType::Variable);
        assert_eq!(product.price, Some(rust_decimal::Decimal::new(350, 2)));
        assert_eq!(product.image.as_ref().unwrap().alt_text, None);
        assert_eq!(product.category_slugs().collect::<Vec<_>>(), vec!["t_shirts"]);
        assert_eq!(product.variations[0].attribute("pa_color"), Some("rojo"));
    }

    #[test]
    fn test_convert_product_without_slug_is_dropped() {
        let raw = RawProduct {
            database_id: 5,
            ..RawProduct::default()
        };
        assert!(convert_product(raw).is_none());
    }

    #[test]
    fn test_convert_category_tree() {
        let raw: RawCategory = serde_json::from_value(serde_json::json!({
            "id": "c1", "databaseId": 1, "name": "Ropa", "slug": "ropa", "count": 12,
            "parent": null,
            "children": { "nodes": [
                { "id": "c2", "databaseId": 2, "name": "Polos", "slug": "pol_s" }
            ] }
        }))
        .unwrap();

        let category = convert_category(raw).unwrap();
        assert!(category.is_top_level());
        assert_eq!(category.children.len(), 1);
        assert_eq!(category.children[0].slug, "pol_s");
    }
}
