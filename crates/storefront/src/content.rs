//! File-based content: markdown pages, service pages and SEO category data.
//!
//! Everything under the content directory is loaded once at startup:
//!
//! - `pages/*.md` - info pages (`/contacto`, `/aviso-legal`, ...) with YAML frontmatter
//! - `services/*.md` - service pages served at `/servicios/{slug}`
//! - `categories/*.json` - SEO landing pages; each file holds one
//!   [`SeoCategory`] or a list of them
//!
//! Category URLs are matched after [`normalize_category_url`], so `/bolsas`,
//! `bolsas/` and `/bolsas/` all resolve to the same page.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::Deserialize;

/// Default number of products in a category's product block.
pub const DEFAULT_BLOCK_LIMIT: i64 = 12;

/// Default grid columns of a category's product block.
pub const DEFAULT_BLOCK_COLUMNS: u8 = 4;

/// Metadata for markdown pages.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
    /// Optional hero image shown above the content.
    #[serde(default)]
    pub image: Option<String>,
}

/// A rendered page with metadata and HTML content
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub meta: PageMeta,
    pub content_html: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeoSubcategory {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeoReview {
    pub text: String,
    pub author: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeoAdvantages {
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeoUseCase {
    pub titulo: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub image_alt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeoFaq {
    pub pregunta: String,
    pub respuesta: String,
}

/// An SEO landing page for a category URL.
#[derive(Debug, Clone, Deserialize)]
pub struct SeoCategory {
    /// Public path, e.g. `/ropa-laboral/camisetas-personalizadas/`.
    pub url: String,
    pub slug: String,
    #[serde(default)]
    pub parent_slug: String,
    #[serde(default)]
    pub search_intent: String,
    #[serde(default)]
    pub siblings_intents: Vec<String>,

    #[serde(rename = "hero_tituloPrincipal", default)]
    pub hero_title: String,
    #[serde(default)]
    pub hero_intro: String,
    #[serde(rename = "hub_subcategorias_texto", default)]
    pub hub_text: String,
    #[serde(default)]
    pub subcategories: Vec<SeoSubcategory>,
    #[serde(default)]
    pub featured_review: Option<SeoReview>,
    #[serde(default)]
    pub filters_seo: BTreeMap<String, Vec<String>>,

    #[serde(rename = "ventajasEmpresa", default)]
    pub advantages: SeoAdvantages,
    #[serde(rename = "casosUso", default)]
    pub use_cases: Vec<SeoUseCase>,
    #[serde(default)]
    pub faq: Vec<SeoFaq>,
    #[serde(rename = "texto_final_refuerzo", default)]
    pub closing_text: String,
    #[serde(rename = "cta_textoCta", default)]
    pub cta_text: String,

    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,

    /// WooCommerce category feeding the product block.
    #[serde(default)]
    pub catalog_category_slug: Option<String>,
    #[serde(default = "default_block_limit")]
    pub limit: i64,
    #[serde(default = "default_block_columns")]
    pub columns: u8,
}

const fn default_block_limit() -> i64 {
    DEFAULT_BLOCK_LIMIT
}

const fn default_block_columns() -> u8 {
    DEFAULT_BLOCK_COLUMNS
}

impl SeoCategory {
    /// Heading for the page: the hero title, else the search intent.
    #[must_use]
    pub fn heading(&self) -> &str {
        if self.hero_title.is_empty() {
            &self.search_intent
        } else {
            &self.hero_title
        }
    }

    /// URL of the parent category, if any.
    #[must_use]
    pub fn parent_url(&self) -> Option<String> {
        (!self.parent_slug.is_empty()).then(|| format!("/{}/", self.parent_slug))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeoFile {
    Many(Vec<SeoCategory>),
    One(Box<SeoCategory>),
}

/// Normalise a category path to `/a/b/` form: leading and trailing slash,
/// no empty segments, lowercase.
#[must_use]
pub fn normalize_category_url(path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", segments.join("/"))
    }
}

/// Content store that holds all loaded content in memory
#[derive(Debug, Clone)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
    services: Arc<HashMap<String, Page>>,
    categories: Arc<Vec<SeoCategory>>,
    category_index: Arc<HashMap<String, usize>>,
}

impl ContentStore {
    /// Load all content from the filesystem.
    ///
    /// Missing subdirectories yield empty collections; files that fail to
    /// parse are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing directory cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let pages = load_markdown_dir(&content_dir.join("pages"))?;
        let services = load_markdown_dir(&content_dir.join("services"))?;
        let categories = load_categories(&content_dir.join("categories"))?;

        tracing::info!(
            pages = pages.len(),
            services = services.len(),
            categories = categories.len(),
            "Content loaded"
        );

        Ok(Self::from_parts(pages, services, categories))
    }

    /// Build a store from already loaded content.
    #[must_use]
    pub fn from_parts(
        pages: HashMap<String, Page>,
        services: HashMap<String, Page>,
        categories: Vec<SeoCategory>,
    ) -> Self {
        let mut category_index = HashMap::new();
        for (i, category) in categories.iter().enumerate() {
            let key = normalize_category_url(&category.url);
            if category_index.insert(key.clone(), i).is_some() {
                tracing::warn!(url = %key, "Duplicate SEO category URL, last one wins");
            }
        }

        Self {
            pages: Arc::new(pages),
            services: Arc::new(services),
            categories: Arc::new(categories),
            category_index: Arc::new(category_index),
        }
    }

    /// Get a page by slug
    #[must_use]
    pub fn get_page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    /// Get a service page by slug
    #[must_use]
    pub fn get_service(&self, slug: &str) -> Option<&Page> {
        self.services.get(slug)
    }

    /// All service pages, sorted by title.
    #[must_use]
    pub fn services(&self) -> Vec<&Page> {
        let mut services: Vec<&Page> = self.services.values().collect();
        services.sort_by(|a, b| a.meta.title.cmp(&b.meta.title));
        services
    }

    /// SEO category for a request path.
    #[must_use]
    pub fn get_category(&self, path: &str) -> Option<&SeoCategory> {
        self.category_index
            .get(&normalize_category_url(path))
            .and_then(|i| self.categories.get(*i))
    }

    /// All SEO categories, in load order.
    pub fn categories(&self) -> impl Iterator<Item = &SeoCategory> {
        self.categories.iter()
    }
}

fn load_markdown_dir(dir: &Path) -> Result<HashMap<String, Page>, ContentError> {
    let mut pages = HashMap::new();

    if !dir.exists() {
        tracing::warn!("Content directory does not exist: {:?}", dir);
        return Ok(pages);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ContentError::Io(e.to_string()))?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "md") {
            match load_page(&path) {
                Ok(page) => {
                    tracing::debug!("Loaded page: {}", page.slug);
                    pages.insert(page.slug.clone(), page);
                }
                Err(e) => {
                    tracing::error!("Failed to load page {:?}: {}", path, e);
                }
            }
        }
    }

    Ok(pages)
}

fn load_page(path: &Path) -> Result<Page, ContentError> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;

    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ContentError::Parse("Invalid filename".to_string()))?
        .to_string();

    parse_page(slug, &content)
}

/// Parse a markdown document with YAML frontmatter.
///
/// # Errors
///
/// Returns `ContentError::Parse` if the frontmatter is missing or invalid.
pub fn parse_page(slug: String, content: &str) -> Result<Page, ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PageMeta> = matter
        .parse(content)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;

    Ok(Page {
        slug,
        meta,
        content_html: render_markdown(&parsed.content),
    })
}

fn load_categories(dir: &Path) -> Result<Vec<SeoCategory>, ContentError> {
    let mut categories = Vec::new();

    if !dir.exists() {
        tracing::warn!("SEO category directory does not exist: {:?}", dir);
        return Ok(categories);
    }

    let mut files: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| ContentError::Io(e.to_string()))?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    for path in files {
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| ContentError::Io(e.to_string()))
            .and_then(|raw| parse_categories(&raw));
        match parsed {
            Ok(mut list) => categories.append(&mut list),
            Err(e) => tracing::error!("Failed to load SEO categories {:?}: {}", path, e),
        }
    }

    Ok(categories)
}

/// Parse one SEO category file (a single object or a list).
///
/// # Errors
///
/// Returns `ContentError::Parse` if the JSON does not match either shape.
pub fn parse_categories(raw: &str) -> Result<Vec<SeoCategory>, ContentError> {
    match serde_json::from_str::<SeoFile>(raw) {
        Ok(SeoFile::Many(list)) => Ok(list),
        Ok(SeoFile::One(one)) => Ok(vec![*one]),
        Err(e) => Err(ContentError::Parse(e.to_string())),
    }
}

/// Render markdown to HTML with GitHub Flavored Markdown support.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());

    // Content is authored in-repo
    options.render.r#unsafe = true;

    markdown_to_html(content, &options)
}

/// Content loading errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATEGORY_JSON: &str = r#"{
        "url": "/bolsas-personalizadas/",
        "slug": "bolsas-personalizadas",
        "parent_slug": "",
        "search_intent": "bolsas personalizadas",
        "hero_tituloPrincipal": "Bolsas personalizadas con tu logo",
        "hero_intro": "Intro",
        "hub_subcategorias_texto": "Explora",
        "ventajasEmpresa": { "titulo": "Ventajas", "items": ["Rápido"] },
        "casosUso": [{ "titulo": "Ferias", "descripcion": "d", "image_alt": "a" }],
        "faq": [{ "pregunta": "¿Mínimo?", "respuesta": "50" }],
        "texto_final_refuerzo": "Fin",
        "cta_textoCta": "Pide presupuesto",
        "meta_title": "Bolsas | IMPACTO33",
        "meta_description": "Bolsas",
        "catalog_category_slug": "bags"
    }"#;

    #[test]
    fn test_normalize_category_url() {
        assert_eq!(normalize_category_url("/bolsas"), "/bolsas/");
        assert_eq!(normalize_category_url("bolsas/"), "/bolsas/");
        assert_eq!(normalize_category_url("//Ropa//Polos/"), "/ropa/polos/");
        assert_eq!(normalize_category_url(""), "/");
    }

    #[test]
    fn test_parse_single_category_with_defaults() {
        let list = parse_categories(CATEGORY_JSON).unwrap();
        assert_eq!(list.len(), 1);
        let category = &list[0];
        assert_eq!(category.heading(), "Bolsas personalizadas con tu logo");
        assert_eq!(category.limit, DEFAULT_BLOCK_LIMIT);
        assert_eq!(category.columns, DEFAULT_BLOCK_COLUMNS);
        assert_eq!(category.catalog_category_slug.as_deref(), Some("bags"));
        assert!(category.parent_url().is_none());
    }

    #[test]
    fn test_parse_category_list() {
        let raw = format!("[{CATEGORY_JSON}, {}]", CATEGORY_JSON.replace("/bolsas-personalizadas/", "/bolsas-personalizadas/tote/"));
        assert_eq!(parse_categories(&raw).unwrap().len(), 2);
        assert!(parse_categories("{\"nope\": 1}").is_err());
    }

    #[test]
    fn test_category_lookup_ignores_slashes() {
        let store = ContentStore::from_parts(
            HashMap::new(),
            HashMap::new(),
            parse_categories(CATEGORY_JSON).unwrap(),
        );
        assert!(store.get_category("/bolsas-personalizadas").is_some());
        assert!(store.get_category("bolsas-personalizadas/").is_some());
        assert!(store.get_category("/tazas/").is_none());
    }

    #[test]
    fn test_parse_page() {
        let page = parse_page(
            "contacto".to_string(),
            "---\ntitle: Contacto\ndescription: Escríbenos\n---\n# Hola\n\n| a | b |\n|---|---|\n| 1 | 2 |\n",
        )
        .unwrap();
        assert_eq!(page.meta.title, "Contacto");
        assert!(page.content_html.contains("<h1"));
        assert!(page.content_html.contains("<table>"));
    }

    #[test]
    fn test_page_without_frontmatter_fails() {
        assert!(parse_page("x".to_string(), "# Sin frontmatter").is_err());
    }
}
