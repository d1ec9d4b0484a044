//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::email::EmailError;
use crate::services::quote::QuoteError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// WooCommerce catalog request failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Sending email failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Quote request was rejected.
    #[error("Quote error: {0}")]
    Quote(#[from] QuoteError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// A feature is switched off in this deployment.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Invalid(_) => StatusCode::BAD_REQUEST,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Catalog(err) => match err {
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::EmailNotConfirmed
                | AuthError::SessionExpired => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) | AuthError::LinkExpired => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                AuthError::Api { .. } | AuthError::Http(_) => StatusCode::BAD_GATEWAY,
                AuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Email(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Quote(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message safe to show to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "No encontrado".to_string(),
            Self::Database(RepositoryError::Invalid(msg)) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "Error interno del servidor".to_string(),
            Self::Catalog(CatalogError::NotFound(_)) => "Producto no encontrado".to_string(),
            Self::Catalog(_) => "El catálogo no está disponible en este momento".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Email o contraseña incorrectos".to_string(),
                AuthError::EmailNotConfirmed => "Confirma tu email antes de entrar".to_string(),
                AuthError::SessionExpired => "Tu sesión ha caducado".to_string(),
                AuthError::UserAlreadyExists => "Ya existe una cuenta con este email".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Email inválido".to_string(),
                AuthError::LinkExpired => "El enlace ha caducado o ya se ha usado".to_string(),
                AuthError::RateLimited => {
                    "Demasiados intentos, prueba de nuevo en unos minutos".to_string()
                }
                _ => "Error de autenticación".to_string(),
            },
            Self::Email(_) => "No hemos podido enviar el email".to_string(),
            Self::Quote(err) => err.to_string(),
            Self::RateLimited => "Demasiadas peticiones".to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::BadRequest(msg)
            | Self::ServiceUnavailable(msg) => msg.clone(),
        }
    }

    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("producto-123".to_string());
        assert_eq!(err.to_string(), "Not found: producto-123");

        let err = AppError::BadRequest("cantidad inválida".to_string());
        assert_eq!(err.to_string(), "Bad request: cantidad inválida");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(get_status(AppError::NotFound("x".to_string())), StatusCode::NOT_FOUND);
        assert_eq!(get_status(AppError::Unauthorized("x".to_string())), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AppError::BadRequest("x".to_string())), StatusCode::BAD_REQUEST);
        assert_eq!(get_status(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            get_status(AppError::ServiceUnavailable("x".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_error_mapping() {
        assert_eq!(get_status(RepositoryError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(RepositoryError::Invalid("pedido vacío".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(RepositoryError::DataCorruption("bad".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_catalog_error_mapping() {
        assert_eq!(
            get_status(CatalogError::NotFound("slug".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(get_status(CatalogError::RateLimited(5).into()), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(get_status(AuthError::InvalidCredentials.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AuthError::UserAlreadyExists.into()), StatusCode::CONFLICT);
        assert_eq!(get_status(AuthError::RateLimited.into()), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            get_status(AuthError::WeakPassword("corta".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("secret column".to_string()));
        assert!(!err.public_message().contains("secret"));
        assert_eq!(
            AppError::Quote(QuoteError::MissingName).public_message(),
            "El nombre es obligatorio"
        );
    }
}
