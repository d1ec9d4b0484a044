//! XML sitemaps: info pages, SEO category pages and products.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use super::xml::XmlDocument;
use crate::catalog::SitemapProduct;
use crate::content::{ContentStore, normalize_category_url};

/// Public routes that are not generated from content or the catalog.
pub const STATIC_ROUTES: &[&str] = &[
    "/",
    "/contacto",
    "/presupuesto-rapido",
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

/// Sitemap file names, relative to the site root.
pub const PAGES_SITEMAP: &str = "sitemap-pages.xml";
pub const PRODUCTS_SITEMAP: &str = "sitemap-products.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFreq {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// One `<url>` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapUrl {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: ChangeFreq,
    pub priority: f32,
    pub image: Option<SitemapImage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapImage {
    pub loc: String,
    pub title: String,
}

fn absolute(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Info pages and the landing page.
#[must_use]
pub fn static_urls(base_url: &str) -> Vec<SitemapUrl> {
    STATIC_ROUTES
        .iter()
        .map(|route| SitemapUrl {
            loc: absolute(base_url, route),
            lastmod: None,
            changefreq: ChangeFreq::Monthly,
            priority: 0.8,
            image: None,
        })
        .collect()
}

/// SEO category landing pages.
#[must_use]
pub fn category_urls(base_url: &str, content: &ContentStore) -> Vec<SitemapUrl> {
    content
        .categories()
        .map(|category| SitemapUrl {
            loc: absolute(base_url, &normalize_category_url(&category.url)),
            lastmod: None,
            changefreq: ChangeFreq::Weekly,
            priority: 0.9,
            image: None,
        })
        .collect()
}

/// Product detail pages.
#[must_use]
pub fn product_urls(base_url: &str, products: &[SitemapProduct]) -> Vec<SitemapUrl> {
    products
        .iter()
        .filter(|p| !p.slug.is_empty())
        .map(|product| SitemapUrl {
            loc: absolute(base_url, &format!("/producto/{}", product.slug)),
            lastmod: product.modified.as_deref().and_then(lastmod_date),
            changefreq: ChangeFreq::Daily,
            priority: 1.0,
            image: product.image_url.as_ref().map(|url| SitemapImage {
                loc: url.clone(),
                title: product_title(&product.slug),
            }),
        })
        .collect()
}

/// `YYYY-MM-DD` from a WordPress date (`2024-05-01T10:20:30` or RFC 3339).
fn lastmod_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Image title derived from the slug when no name is available.
fn product_title(slug: &str) -> String {
    super::merchant::normalize_attribute_value(slug)
}

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";

/// Render a `<urlset>` document.
#[must_use]
pub fn render_urlset(urls: &[SitemapUrl]) -> String {
    let mut namespaces = vec![("xmlns", SITEMAP_NS)];
    if urls.iter().any(|u| u.image.is_some()) {
        namespaces.push(("xmlns:image", IMAGE_NS));
    }

    let mut doc = XmlDocument::start();
    doc.open("urlset", &namespaces);
    for url in urls {
        doc.open("url", &[]);
        doc.element("loc", &url.loc);
        doc.optional("lastmod", url.lastmod.as_deref());
        doc.element("changefreq", url.changefreq.as_str());
        doc.element("priority", &format!("{:.1}", url.priority));
        if let Some(image) = &url.image {
            doc.open("image:image", &[]);
            doc.element("image:loc", &image.loc);
            doc.element("image:title", &image.title);
            doc.close("image:image");
        }
        doc.close("url");
    }
    doc.close("urlset");
    doc.finish()
}

/// Pages sitemap: static routes then SEO categories.
#[must_use]
pub fn pages_sitemap(base_url: &str, content: &ContentStore) -> String {
    let mut urls = static_urls(base_url);
    urls.extend(category_urls(base_url, content));
    render_urlset(&urls)
}

#[must_use]
pub fn products_sitemap(base_url: &str, products: &[SitemapProduct]) -> String {
    render_urlset(&product_urls(base_url, products))
}

/// Sitemap index pointing at the pages and products sitemaps.
#[must_use]
pub fn sitemap_index(base_url: &str, generated_at: DateTime<Utc>) -> String {
    let lastmod = generated_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut doc = XmlDocument::start();
    doc.open("sitemapindex", &[("xmlns", SITEMAP_NS)]);
    for file in [PAGES_SITEMAP, PRODUCTS_SITEMAP] {
        doc.open("sitemap", &[]);
        doc.element("loc", &absolute(base_url, file));
        doc.element("lastmod", &lastmod);
        doc.close("sitemap");
    }
    doc.close("sitemapindex");
    doc.finish()
}
