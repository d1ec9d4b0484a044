//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] impacto33_core::EmailError),

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but its email address was never confirmed.
    #[error("email not confirmed")]
    EmailNotConfirmed,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or confirmation mismatch.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Too many auth requests for this address or IP.
    #[error("rate limited by auth provider")]
    RateLimited,

    /// Access and refresh tokens are no longer valid.
    #[error("session expired")]
    SessionExpired,

    /// A confirmation or recovery link was already used or has expired.
    #[error("link expired or already used")]
    LinkExpired,

    /// Any other error response from the auth API.
    #[error("auth API error {status}: {message}")]
    Api { status: u16, message: String },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AuthError {
    /// Short code used in `?error=` redirects and template messages.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) => "invalid_email",
            Self::InvalidCredentials => "invalid_credentials",
            Self::EmailNotConfirmed => "email_not_confirmed",
            Self::UserAlreadyExists => "user_exists",
            Self::WeakPassword(_) => "weak_password",
            Self::RateLimited => "rate_limited",
            Self::SessionExpired => "session_expired",
            Self::LinkExpired => "link_expired",
            Self::Api { .. } | Self::Http(_) | Self::Repository(_) => "server",
        }
    }
}
