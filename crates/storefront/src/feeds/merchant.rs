//! Google Merchant Center product feed (RSS 2.0 with the `g:` namespace).
//!
//! Variable products expand into one item per variation, grouped under the
//! parent's id; every other product becomes a single item.

use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::join_all;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use crate::catalog::{
    CatalogClient, Image, Product, ProductType, ProductVariation, StockStatus, VariationAttribute,
};
use super::xml::XmlDocument;
use crate::site::BRAND_NAME;

/// Variable products whose variations are fetched concurrently.
const VARIATION_BATCH_SIZE: usize = 10;

/// Google truncates longer descriptions.
const MAX_DESCRIPTION_CHARS: usize = 5000;

const FEED_TITLE: &str = "IMPACTO33 - Regalos Publicitarios y Ropa Personalizada";
const FEED_DESCRIPTION: &str = "Catálogo completo de productos personalizados: ropa, merchandising, regalos publicitarios y artículos promocionales";

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"<[^>]*>").unwrap()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\s+").unwrap()
});

/// Plain-text description: tags stripped, HTML entities (named and
/// numeric) decoded, whitespace collapsed and truncated to the Merchant
/// Center limit.
#[must_use]
pub fn clean_description(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let text = HTML_TAG.replace_all(html, "");
    let text = decode_entities(&text);
    let text = WHITESPACE.replace_all(&text, " ");
    let text = text.trim();

    if text.chars().count() > MAX_DESCRIPTION_CHARS {
        let head: String = text.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Decode HTML5 named and numeric character references. Text with a stray
/// `&` that is not a reference is kept as written.
fn decode_entities(text: &str) -> Cow<'_, str> {
    unescape_with(text, resolve_html5_entity).unwrap_or(Cow::Borrowed(text))
}

/// Merchant price format, e.g. `12.50 EUR`.
#[must_use]
pub fn format_feed_price(price: Option<Decimal>) -> String {
    let amount = price.unwrap_or(Decimal::ZERO).round_dp(2);
    format!("{amount:.2} EUR")
}

/// Merchant availability value for a stock status.
#[must_use]
pub const fn availability(status: StockStatus) -> &'static str {
    match status {
        StockStatus::InStock => "in stock",
        StockStatus::OutOfStock => "out of stock",
        StockStatus::OnBackorder => "preorder",
    }
}

/// First attribute whose name contains `needle` (case-insensitive).
fn attribute_containing<'a>(attributes: &'a [VariationAttribute], needle: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|attr| attr.name.to_lowercase().contains(needle))
        .map(|attr| attr.value.as_str())
        .filter(|value| !value.is_empty())
}

/// Display form of an attribute slug: `azul-marino` becomes `Azul Marino`.
#[must_use]
pub fn normalize_attribute_value(value: &str) -> String {
    value
        .replace('-', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One `<item>` of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub image_link: Option<String>,
    pub price: String,
    pub availability: &'static str,
    pub mpn: Option<String>,
    pub item_group_id: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl FeedItem {
    fn for_product(product: &Product, base_url: &str) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.name.clone(),
            description: clean_description(product.description.as_deref().unwrap_or_default()),
            link: product_link(base_url, &product.slug),
            image_link: product.image.as_ref().map(|img| img.url.clone()),
            price: format_feed_price(product.display_price()),
            availability: availability(product.stock_status),
            mpn: non_empty(product.sku.as_deref()),
            item_group_id: None,
            color: None,
            size: None,
        }
    }

    fn for_variation(product: &Product, variation: &ProductVariation, base_url: &str) -> Self {
        let color = attribute_containing(&variation.attributes, "color").map(normalize_attribute_value);
        let size = attribute_containing(&variation.attributes, "talla").map(normalize_attribute_value);

        let title = if color.is_some() || size.is_some() {
            std::iter::once(product.name.as_str())
                .chain(color.as_deref())
                .chain(size.as_deref())
                .collect::<Vec<_>>()
                .join(" - ")
        } else {
            variation.name.clone()
        };

        let description = variation
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(product.description.as_deref())
            .unwrap_or_default();

        Self {
            id: variation.id.to_string(),
            title,
            description: clean_description(description),
            link: product_link(base_url, &product.slug),
            image_link: variation
                .image
                .as_ref()
                .or(product.image.as_ref())
                .map(|img: &Image| img.url.clone()),
            price: format_feed_price(
                variation
                    .sale_price
                    .or(variation.price)
                    .or(variation.regular_price),
            ),
            availability: availability(variation.stock_status),
            mpn: non_empty(variation.sku.as_deref()).or_else(|| non_empty(product.sku.as_deref())),
            item_group_id: Some(product.id.to_string()),
            color,
            size,
        }
    }

    fn write_xml(&self, doc: &mut XmlDocument) {
        doc.open("item", &[]);
        doc.element("g:id", &self.id);
        doc.element("g:title", &self.title);
        doc.element("g:description", &self.description);
        doc.element("g:link", &self.link);
        doc.optional("g:image_link", self.image_link.as_deref());
        doc.element("g:price", &self.price);
        doc.element("g:availability", self.availability);
        doc.element("g:condition", "new");
        doc.element("g:brand", BRAND_NAME);
        doc.optional("g:mpn", self.mpn.as_deref());
        doc.optional("g:item_group_id", self.item_group_id.as_deref());
        doc.optional("g:color", self.color.as_deref());
        doc.optional("g:size", self.size.as_deref());
        doc.close("item");
    }
}

fn product_link(base_url: &str, slug: &str) -> String {
    format!("{}/producto/{slug}", base_url.trim_end_matches('/'))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Feed items for a list of products.
#[must_use]
pub fn feed_items(products: &[Product], base_url: &str) -> Vec<FeedItem> {
    products
        .iter()
        .flat_map(|product| {
            if product.product_type == ProductType::Variable && !product.variations.is_empty() {
                product
                    .variations
                    .iter()
                    .map(|variation| FeedItem::for_variation(product, variation, base_url))
                    .collect::<Vec<_>>()
            } else {
                vec![FeedItem::for_product(product, base_url)]
            }
        })
        .collect()
}

/// Render the RSS document.
#[must_use]
pub fn render_feed(items: &[FeedItem], base_url: &str, built_at: DateTime<Utc>) -> String {
    let mut doc = XmlDocument::start();
    doc.open(
        "rss",
        &[("version", "2.0"), ("xmlns:g", "http://base.google.com/ns/1.0")],
    );
    doc.open("channel", &[]);
    doc.element("title", FEED_TITLE);
    doc.element("link", base_url.trim_end_matches('/'));
    doc.element("description", FEED_DESCRIPTION);
    doc.element(
        "lastBuildDate",
        &built_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    for item in items {
        item.write_xml(&mut doc);
    }
    doc.close("channel");
    doc.close("rss");
    doc.finish()
}

/// Every product, with variations loaded for variable products that came
/// back without them.
#[instrument(skip(catalog))]
pub async fn fetch_feed_products(catalog: &CatalogClient) -> Vec<Product> {
    let mut products = catalog.get_all_products_for_feed().await;

    let pending: Vec<usize> = products
        .iter()
        .enumerate()
        .filter(|(_, p)| p.product_type == ProductType::Variable && p.variations.is_empty())
        .map(|(i, _)| i)
        .collect();

    for batch in pending.chunks(VARIATION_BATCH_SIZE) {
        let fetched = join_all(batch.iter().filter_map(|&i| {
            products
                .get(i)
                .map(|p| catalog.get_product_variations(p.id))
        }))
        .await;

        for (&i, variations) in batch.iter().zip(fetched) {
            if let Some(product) = products.get_mut(i) {
                product.variations = variations;
            }
        }
    }

    info!(
        products = products.len(),
        enriched = pending.len(),
        "Loaded products for merchant feed"
    );
    products
}

/// A freshly built feed.
pub struct GeneratedFeed {
    pub xml: String,
    pub item_count: usize,
}

/// Fetch the catalog and render the feed.
pub async fn generate_feed(catalog: &CatalogClient, base_url: &str) -> GeneratedFeed {
    let products = fetch_feed_products(catalog).await;
    let items = feed_items(&products, base_url);
    info!(
        items = items.len(),
        products = products.len(),
        "Generated merchant feed"
    );
    GeneratedFeed {
        xml: render_feed(&items, base_url, Utc::now()),
        item_count: items.len(),
    }
}

/// Body of `GET /feeds/google.xml/stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStats {
    pub total_products: usize,
    pub simple_products: usize,
    pub variable_products: usize,
    pub total_feed_items: usize,
    pub cache_status: &'static str,
    pub cache_age: Option<u64>,
    pub cache_expiry: Option<u64>,
}

impl FeedStats {
    /// Count products by type; the item total comes from the cached feed
    /// when there is one.
    #[must_use]
    pub fn new(products: &[Product], state: super::CacheState, cached_items: Option<usize>) -> Self {
        let variable_products = products
            .iter()
            .filter(|p| p.product_type == ProductType::Variable)
            .count();
        Self {
            total_products: products.len(),
            simple_products: products.len() - variable_products,
            variable_products,
            total_feed_items: cached_items.unwrap_or(products.len()),
            cache_status: if state.valid { "valid" } else { "expired" },
            cache_age: state.age_secs,
            cache_expiry: state.expires_in_secs,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use impacto33_core::{ProductId, VariationId};

    fn product(product_type: ProductType) -> Product {
        Product {
            id: ProductId::new(42),
            global_id: "cHJvZHVjdDo0Mg==".to_string(),
            name: "Camiseta Básica".to_string(),
            slug: "camiseta-basica".to_string(),
            sku: Some("CAM-01".to_string()),
            product_type,
            featured: false,
            description: Some("<p>Algodón &amp; poliéster</p>".to_string()),
            short_description: None,
            price: Some(Decimal::new(55, 1)),
            regular_price: Some(Decimal::new(6, 0)),
            sale_price: None,
            stock_status: StockStatus::InStock,
            stock_quantity: None,
            image: Some(Image {
                url: "https://cdn.example.com/cam.jpg".to_string(),
                alt_text: None,
            }),
            gallery: vec![],
            categories: vec![],
            attributes: vec![],
            variations: vec![],
            related: vec![],
            modified: None,
        }
    }

    fn variation(id: i32, color: &str, size: &str, sku: Option<&str>) -> ProductVariation {
        ProductVariation {
            id: VariationId::new(id),
            name: "Camiseta Básica - variación".to_string(),
            description: None,
            sku: sku.map(str::to_string),
            price: Some(Decimal::new(725, 2)),
            regular_price: None,
            sale_price: None,
            stock_status: StockStatus::OnBackorder,
            stock_quantity: None,
            image: None,
            attributes: vec![
                VariationAttribute {
                    name: "pa_color".to_string(),
                    value: color.to_string(),
                },
                VariationAttribute {
                    name: "pa_talla".to_string(),
                    value: size.to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(
            clean_description("<p>Hola&nbsp;<strong>mundo</strong></p>\n\n<p>&amp; más</p>"),
            "Hola mundo & más"
        );
        assert_eq!(clean_description(""), "");
        assert_eq!(
            clean_description("Tallas S&#8211;XL desde 5&#x20AC; &hellip;"),
            "Tallas S–XL desde 5€ …"
        );
        assert_eq!(clean_description("Rojo & azul"), "Rojo & azul");

        let long = "a".repeat(6000);
        let cleaned = clean_description(&long);
        assert_eq!(cleaned.chars().count(), 5000);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn test_format_feed_price() {
        assert_eq!(format_feed_price(Some(Decimal::new(125, 1))), "12.50 EUR");
        assert_eq!(format_feed_price(Some(Decimal::new(3, 0))), "3.00 EUR");
        assert_eq!(format_feed_price(None), "0.00 EUR");
    }

    #[test]
    fn test_availability() {
        assert_eq!(availability(StockStatus::InStock), "in stock");
        assert_eq!(availability(StockStatus::OutOfStock), "out of stock");
        assert_eq!(availability(StockStatus::OnBackorder), "preorder");
    }

    #[test]
    fn test_normalize_attribute_value() {
        assert_eq!(normalize_attribute_value("azul-marino"), "Azul Marino");
        assert_eq!(normalize_attribute_value("xl"), "Xl");
        assert_eq!(normalize_attribute_value(""), "");
    }

    #[test]
    fn test_simple_product_item() {
        let items = feed_items(&[product(ProductType::Simple)], "https://impacto33.com/");
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.id, "42");
        assert_eq!(item.title, "Camiseta Básica");
        assert_eq!(item.description, "Algodón & poliéster");
        assert_eq!(item.link, "https://impacto33.com/producto/camiseta-basica");
        assert_eq!(item.price, "5.50 EUR");
        assert_eq!(item.mpn.as_deref(), Some("CAM-01"));
        assert!(item.item_group_id.is_none());
    }

    #[test]
    fn test_variable_product_expands_variations() {
        let mut parent = product(ProductType::Variable);
        parent.variations = vec![
            variation(101, "azul-marino", "xl", Some("CAM-01-AZ-XL")),
            variation(102, "rojo", "m", None),
        ];

        let items = feed_items(&[parent], "https://impacto33.com");
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].id, "101");
        assert_eq!(items[0].title, "Camiseta Básica - Azul Marino - Xl");
        assert_eq!(items[0].item_group_id.as_deref(), Some("42"));
        assert_eq!(items[0].color.as_deref(), Some("Azul Marino"));
        assert_eq!(items[0].size.as_deref(), Some("Xl"));
        assert_eq!(items[0].availability, "preorder");
        assert_eq!(items[0].price, "7.25 EUR");
        // Falls back to the parent's image and description
        assert_eq!(items[0].image_link.as_deref(), Some("https://cdn.example.com/cam.jpg"));
        assert_eq!(items[0].description, "Algodón & poliéster");

        assert_eq!(items[0].mpn.as_deref(), Some("CAM-01-AZ-XL"));
        assert_eq!(items[1].mpn.as_deref(), Some("CAM-01"));
    }

    #[test]
    fn test_variable_without_variations_is_single_item() {
        let items = feed_items(&[product(ProductType::Variable)], "https://impacto33.com");
        assert_eq!(items.len(), 1);
        assert!(items[0].item_group_id.is_none());
    }

    #[test]
    fn test_render_feed() {
        let items = feed_items(&[product(ProductType::Simple)], "https://impacto33.com");
        let built_at = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let xml = render_feed(&items, "https://impacto33.com", built_at);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("xmlns:g=\"http://base.google.com/ns/1.0\""));
        assert!(xml.contains("<lastBuildDate>2026-03-01T10:00:00.000Z</lastBuildDate>"));
        assert!(xml.contains("<g:description>Algodón &amp; poliéster</g:description>"));
        assert!(xml.contains("<g:condition>new</g:condition>"));
        assert!(xml.contains("<g:brand>IMPACTO33</g:brand>"));
        assert!(xml.ends_with("</channel>\n</rss>"));
    }

    #[test]
    fn test_render_feed_escapes_markup_in_fields() {
        let mut item = feed_items(&[product(ProductType::Simple)], "https://impacto33.com").remove(0);
        item.title = "Taza <XL> & Mug".to_string();
        item.image_link = Some("https://cdn.example.com/t.jpg?w=1&h=2".to_string());
        let xml = render_feed(&[item], "https://impacto33.com", Utc::now());

        assert!(xml.contains("<g:title>Taza &lt;XL&gt; &amp; Mug</g:title>"));
        assert!(xml.contains("<g:image_link>https://cdn.example.com/t.jpg?w=1&amp;h=2</g:image_link>"));
        assert!(!xml.contains("<XL>"));
    }

    #[test]
    fn test_feed_stats() {
        let products = vec![product(ProductType::Simple), product(ProductType::Variable)];
        let state = super::super::CacheState {
            valid: false,
            age_secs: None,
            expires_in_secs: None,
        };
        let stats = FeedStats::new(&products, state, None);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalProducts"], 2);
        assert_eq!(json["simpleProducts"], 1);
        assert_eq!(json["variableProducts"], 1);
        assert_eq!(json["totalFeedItems"], 2);
        assert_eq!(json["cacheStatus"], "expired");
        assert!(json["cacheAge"].is_null());
    }
}
