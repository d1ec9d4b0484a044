//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - Supabase `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (e.g. `https://impacto33.com`)
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `WOOCOMMERCE_GRAPHQL_URL` - WPGraphQL endpoint of the WooCommerce catalog
//! - `SUPABASE_URL` - Supabase project URL (Auth lives under `/auth/v1`)
//! - `SUPABASE_ANON_KEY` - Supabase public API key
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CONTENT_DIR` - Markdown/JSON content (default: crates/storefront/content)
//! - `STOREFRONT_STATIC_DIR` - Static assets (default: crates/storefront/static)
//! - `SMTP_HOST` - SMTP relay; quote emails are disabled when unset
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SMTP_USER` / `SMTP_PASS` - SMTP credentials
//! - `QUOTE_FROM_ADDRESS` - Sender of quote emails (default: `SMTP_USER`)
//! - `QUOTE_COMPANY_ADDRESS` - Inbox receiving quote copies (default: site contact email)
//! - `STRIPE_ENABLED` - `"true"` enables online payment (default: disabled)
//! - `STRIPE_PUBLIC_KEY` - Stripe publishable key
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::site;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SMTP_PORT: u16 = 587;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Message shown at checkout while online payment is switched off.
pub const STRIPE_DISABLED_MESSAGE: &str = "El pago online todavía no está disponible. \
    Solicita presupuesto y te contactaremos para finalizar tu pedido.";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront, without trailing slash
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Directory holding markdown pages and SEO category JSON
    pub content_dir: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// WooCommerce GraphQL configuration
    pub woocommerce: WooCommerceConfig,
    /// Supabase Auth configuration
    pub supabase: SupabaseConfig,
    /// SMTP configuration for quote emails (disabled when `None`)
    pub email: Option<EmailConfig>,
    /// Online payment feature flag
    pub stripe: StripeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// WooCommerce (WPGraphQL) catalog configuration.
#[derive(Debug, Clone)]
pub struct WooCommerceConfig {
    /// GraphQL endpoint, e.g. `https://tienda.example.com/graphql`
    pub graphql_url: String,
}

/// Supabase project configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`
    pub url: String,
    /// Public (anon) API key sent as the `apikey` header
    pub anon_key: SecretString,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

/// SMTP configuration for transactional email.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    /// Sender address for outgoing mail
    pub from_address: String,
    /// Inbox that receives a copy of every quote request
    pub company_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("company_address", &self.company_address)
            .finish()
    }
}

/// Stripe feature flag.
///
/// Payment collection is not implemented; the flag only decides what the
/// checkout placeholder shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripeConfig {
    /// `STRIPE_ENABLED == "true"`
    pub enabled: bool,
    /// Publishable key (empty when unset)
    pub public_key: String,
}

impl StripeConfig {
    /// Build the flag from raw environment values.
    #[must_use]
    pub fn from_values(enabled: Option<&str>, public_key: Option<&str>) -> Self {
        Self {
            enabled: enabled == Some("true"),
            public_key: public_key.unwrap_or_default().trim().to_string(),
        }
    }

    /// A disabled flag is always valid; an enabled one needs a public key.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.enabled || !self.public_key.is_empty()
    }

    /// Whether checkout should offer online payment.
    #[must_use]
    pub fn is_stripe_enabled(&self) -> bool {
        self.enabled && self.is_valid()
    }

    /// Message to show instead of the payment form.
    #[must_use]
    pub const fn disabled_message(&self) -> &'static str {
        STRIPE_DISABLED_MESSAGE
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = parse_env_or_default("STOREFRONT_PORT", 3000_u16)?;
        let base_url = validate_base_url(&get_required_env("STOREFRONT_BASE_URL")?)?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        let stripe = StripeConfig::from_values(
            get_optional_env("STRIPE_ENABLED").as_deref(),
            get_optional_env("STRIPE_PUBLIC_KEY").as_deref(),
        );
        if !stripe.is_valid() {
            tracing::warn!("STRIPE_ENABLED is true but STRIPE_PUBLIC_KEY is empty; payments stay disabled");
        }

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            content_dir: PathBuf::from(get_env_or_default(
                "STOREFRONT_CONTENT_DIR",
                "crates/storefront/content",
            )),
            static_dir: PathBuf::from(get_env_or_default(
                "STOREFRONT_STATIC_DIR",
                "crates/storefront/static",
            )),
            woocommerce: WooCommerceConfig {
                graphql_url: get_required_env("WOOCOMMERCE_GRAPHQL_URL")?,
            },
            supabase: SupabaseConfig {
                url: get_required_env("SUPABASE_URL")?
                    .trim_end_matches('/')
                    .to_string(),
                anon_key: get_required_secret("SUPABASE_ANON_KEY")?,
            },
            email: EmailConfig::from_env()?,
            stripe,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", 1.0_f32)?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", 0.0_f32)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Absolute URL for a site path (`/producto/x` → `https://…/producto/x`).
    #[must_use]
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Whether the public site is served over https.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl EmailConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };
        let smtp_username = get_required_env("SMTP_USER")?;

        Ok(Some(Self {
            smtp_host,
            smtp_port: parse_env_or_default("SMTP_PORT", DEFAULT_SMTP_PORT)?,
            from_address: get_optional_env("QUOTE_FROM_ADDRESS")
                .unwrap_or_else(|| smtp_username.clone()),
            smtp_username,
            smtp_password: get_required_secret("SMTP_PASS")?,
            company_address: get_env_or_default("QUOTE_COMPANY_ADDRESS", site::CONTACT_EMAIL),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., STOREFRONT_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL (set by Fly.io postgres attach)
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

/// Require an absolute http(s) base URL and strip any trailing slash.
fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| {
        ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_changeme() {
        let result = validate_secret_strength("changeme123", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_ok());
    }

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            content_dir: PathBuf::from("content"),
            static_dir: PathBuf::from("static"),
            woocommerce: WooCommerceConfig {
                graphql_url: "https://tienda.test/graphql".to_string(),
            },
            supabase: SupabaseConfig {
                url: "https://project.supabase.co".to_string(),
                anon_key: SecretString::from("anon_key_value_that_is_secret"),
            },
            email: None,
            stripe: StripeConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            test_config().absolute_url("/producto/camiseta"),
            "http://localhost:3000/producto/camiseta"
        );
    }

    #[test]
    fn test_validate_base_url_strips_trailing_slash() {
        assert_eq!(
            validate_base_url("https://impacto33.com/").unwrap(),
            "https://impacto33.com"
        );
        assert!(validate_base_url("ftp://impacto33.com").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn test_stripe_flag() {
        let off = StripeConfig::from_values(None, None);
        assert!(off.is_valid());
        assert!(!off.is_stripe_enabled());

        let missing_key = StripeConfig::from_values(Some("true"), Some("  "));
        assert!(!missing_key.is_valid());
        assert!(!missing_key.is_stripe_enabled());

        let on = StripeConfig::from_values(Some("true"), Some("pk_live_123"));
        assert!(on.is_stripe_enabled());

        // Only the exact string "true" enables payments
        assert!(!StripeConfig::from_values(Some("TRUE"), Some("pk")).enabled);
        assert!(off.disabled_message().contains("presupuesto"));
    }

    #[test]
    fn test_supabase_config_debug_redacts_secrets() {
        let debug_output = format!("{:?}", test_config().supabase);

        assert!(debug_output.contains("project.supabase.co"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("anon_key_value_that_is_secret"));
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let config = EmailConfig {
            smtp_host: "smtp.test".to_string(),
            smtp_port: 587,
            smtp_username: "ventas@impacto33.com".to_string(),
            smtp_password: SecretString::from("smtp_password_value"),
            from_address: "ventas@impacto33.com".to_string(),
            company_address: "info@impacto33.com".to_string(),
        };
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("smtp.test"));
        assert!(!debug_output.contains("smtp_password_value"));
    }
}
