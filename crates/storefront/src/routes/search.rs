//! Search route handlers.
//!
//! Product search goes straight to the WooCommerce GraphQL `search` filter.
//! Signed-in users get a per-account history, served as an HTMX fragment
//! under the search box.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use impacto33_core::SearchHistoryId;

use crate::db::{RECENT_SEARCHES_LIMIT, SearchHistoryRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, RequireAuth};
use crate::models::{CurrentUser, SearchHistoryEntry};
use crate::routes::layout::PageLayout;
use crate::routes::views::{ProductCard, cards};
use crate::state::AppState;

/// Results on the search page.
const SEARCH_LIMIT: i64 = 24;

/// Longest query we forward to the catalog.
const MAX_QUERY_CHARS: usize = 100;

/// Search page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

impl SearchQuery {
    fn term(&self) -> String {
        self.q.trim().chars().take(MAX_QUERY_CHARS).collect()
    }
}

/// One history entry as shown under the search box.
#[derive(Debug, Clone)]
pub struct HistoryEntryView {
    pub id: String,
    pub query: String,
    pub url: String,
}

impl From<&SearchHistoryEntry> for HistoryEntryView {
    fn from(entry: &SearchHistoryEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            query: entry.query.clone(),
            url: format!("/buscar?q={}", urlencoding::encode(&entry.query)),
        }
    }
}

/// Full search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search/index.html")]
pub struct SearchPageTemplate {
    pub layout: PageLayout,
    pub query: String,
    pub results: Vec<ProductCard>,
    pub history: Vec<HistoryEntryView>,
    pub unavailable: bool,
}

/// Search history fragment (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/search_history.html")]
pub struct SearchHistoryTemplate {
    pub entries: Vec<HistoryEntryView>,
}

async fn load_history(state: &AppState, user: &CurrentUser) -> Vec<HistoryEntryView> {
    SearchHistoryRepository::new(state.pool())
        .recent(user.id, RECENT_SEARCHES_LIMIT)
        .await
        .map(|entries| entries.iter().map(HistoryEntryView::from).collect())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load search history");
            Vec::new()
        })
}

/// Full search page.
#[instrument(skip(state, nonce, user))]
pub async fn search_page(
    State(state): State<AppState>,
    nonce: CspNonce,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let term = query.term();

    let (results, unavailable) = match state.catalog().search_products(&term, SEARCH_LIMIT).await {
        Ok(products) => (cards(&products), false),
        Err(e) => {
            tracing::error!(error = %e, "Product search failed");
            (Vec::new(), true)
        }
    };

    let mut history = Vec::new();
    if let Some(user) = &user {
        if let Err(e) = SearchHistoryRepository::new(state.pool())
            .track(user.id, &term)
            .await
        {
            tracing::warn!(error = %e, "Failed to record search");
        }
        history = load_history(&state, user).await;
    }

    let title = if term.is_empty() {
        "Buscar".to_string()
    } else {
        format!("Resultados para \"{term}\"")
    };

    SearchPageTemplate {
        layout: PageLayout::new(nonce, Some(&title))
            .with_user(user.as_ref())
            .private(),
        query: term,
        results,
        history,
        unavailable,
    }
}

/// Recent searches fragment; empty for anonymous visitors.
#[instrument(skip(state, user))]
pub async fn history(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    let entries = match &user {
        Some(user) => load_history(&state, user).await,
        None => Vec::new(),
    };
    SearchHistoryTemplate { entries }
}

/// Delete one history entry and return the refreshed fragment.
#[instrument(skip(state, user))]
pub async fn delete_entry(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id: SearchHistoryId = id
        .parse()
        .map_err(|_| AppError::NotFound("Búsqueda no encontrada".to_string()))?;

    match SearchHistoryRepository::new(state.pool()).delete(user.id, id).await {
        Ok(()) | Err(crate::db::RepositoryError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(SearchHistoryTemplate {
        entries: load_history(&state, &user).await,
    })
}

/// Clear the whole history.
#[instrument(skip(state, user))]
pub async fn clear_history(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let removed = SearchHistoryRepository::new(state.pool()).clear(user.id).await?;
    tracing::debug!(removed, "Search history cleared");
    Ok(SearchHistoryTemplate { entries: Vec::new() })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use impacto33_core::UserId;

    #[test]
    fn test_term_is_trimmed_and_capped() {
        let query = SearchQuery {
            q: format!("  {}  ", "a".repeat(150)),
        };
        assert_eq!(query.term().len(), MAX_QUERY_CHARS);

        let query = SearchQuery {
            q: "  tazas  ".to_string(),
        };
        assert_eq!(query.term(), "tazas");
    }

    #[test]
    fn test_history_entry_url_is_encoded() {
        let entry = SearchHistoryEntry {
            id: SearchHistoryId::new(uuid::Uuid::nil()),
            user_id: UserId::new(uuid::Uuid::nil()),
            query: "bolsas de tela".to_string(),
            created_at: Utc::now(),
        };
        let view = HistoryEntryView::from(&entry);
        assert_eq!(view.url, "/buscar?q=bolsas%20de%20tela");
        assert_eq!(view.query, "bolsas de tela");
    }
}
