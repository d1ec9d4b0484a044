//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;
use crate::content::ContentStore;
use crate::feeds::FeedCache;
use crate::services::auth::SupabaseAuthClient;
use crate::services::email::EmailService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: CatalogClient,
    auth: SupabaseAuthClient,
    content: ContentStore,
    email: Option<EmailService>,
    feed_cache: FeedCache,
}

impl AppState {
    /// Create the application state.
    ///
    /// Email is disabled when SMTP is not configured or the relay cannot be
    /// set up; quote requests then answer 503.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool, content: ContentStore) -> Self {
        let catalog = CatalogClient::new(&config.woocommerce);
        let auth = SupabaseAuthClient::new(&config.supabase);

        let email = config.email.as_ref().and_then(|email_config| {
            EmailService::new(email_config)
                .inspect_err(|e| tracing::error!(error = %e, "SMTP setup failed, email disabled"))
                .ok()
        });
        if email.is_none() {
            tracing::warn!("Email is not configured; quote requests will be rejected");
        }

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                auth,
                content,
                email,
                feed_cache: FeedCache::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// WooCommerce catalog client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Supabase Auth client.
    #[must_use]
    pub fn auth(&self) -> &SupabaseAuthClient {
        &self.inner.auth
    }

    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Email service, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    #[must_use]
    pub fn feed_cache(&self) -> &FeedCache {
        &self.inner.feed_cache
    }
}
