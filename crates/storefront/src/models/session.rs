//! Session-related types.
//!
//! Types stored in the session for authentication state.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use impacto33_core::{Email, UserId};

use crate::services::auth::AuthSession;

/// Seconds before expiry at which the access token is refreshed.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Session-stored user identity.
///
/// Holds the Supabase tokens so that profile and password changes can be made
/// on the user's behalf. The session record lives server-side; the cookie
/// only carries its id.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Supabase Auth user id.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) at which the access token expires.
    pub expires_at: i64,
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl CurrentUser {
    /// Build the session identity from a fresh Supabase session.
    ///
    /// `fallback_email` is used when Supabase omits the address (phone logins).
    #[must_use]
    pub fn from_auth_session(session: &AuthSession, fallback_email: &Email) -> Self {
        use secrecy::ExposeSecret;

        let email = session
            .user
            .email
            .as_deref()
            .and_then(|e| Email::parse(e).ok())
            .unwrap_or_else(|| fallback_email.clone());

        Self {
            id: session.user.id,
            email,
            access_token: session.access_token.expose_secret().to_string(),
            refresh_token: session.refresh_token.expose_secret().to_string(),
            expires_at: session.expires_at,
        }
    }

    /// Whether the access token is expired or about to expire.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.expires_at - REFRESH_MARGIN_SECS <= Utc::now().timestamp()
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the email of a registration waiting for confirmation.
    pub const PENDING_CONFIRMATION_EMAIL: &str = "pending_confirmation_email";

    /// Key for the path to return to after login.
    pub const RETURN_TO: &str = "return_to";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(expires_at: i64) -> CurrentUser {
        CurrentUser {
            id: "6f1c2f0e-3d7a-4b7e-9a43-2f1f6c0b8d11".parse().unwrap(),
            email: Email::parse("ana@empresa.es").unwrap(),
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_needs_refresh() {
        let now = Utc::now().timestamp();
        assert!(user(now - 10).needs_refresh());
        assert!(user(now + 30).needs_refresh());
        assert!(!user(now + 3600).needs_refresh());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", user(0));
        assert!(debug.contains("ana@empresa.es"));
        assert!(!debug.contains("access\""));
        assert!(!debug.contains("refresh\""));
    }
}
