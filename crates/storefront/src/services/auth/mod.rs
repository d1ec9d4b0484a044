//! Authentication service.
//!
//! Thin client over the Supabase Auth (GoTrue) REST API. Supabase owns the
//! accounts and passwords; the storefront only keeps the resulting tokens in
//! its server-side session.

mod error;

pub use error::AuthError;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use impacto33_core::{Email, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::SupabaseConfig;

/// Minimum password length accepted by the Supabase project.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// User identity returned by Supabase Auth.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
}

/// Tokens for a signed-in user.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone)]
pub struct AuthSession {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    /// Unix timestamp (seconds) at which the access token expires.
    pub expires_at: i64,
    pub user: AuthUser,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Result of a sign-up request.
#[derive(Debug)]
pub enum SignUpOutcome {
    /// The project auto-confirms accounts; the user is signed in.
    Session(AuthSession),
    /// A confirmation email was sent; the user must follow the link first.
    ConfirmationRequired,
}

/// Kind of one-time token being verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyKind {
    Recovery,
    Signup,
    Email,
}

impl VerifyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recovery => "recovery",
            Self::Signup => "signup",
            Self::Email => "email",
        }
    }
}

/// Check a new password and its confirmation before sending it to Supabase.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short or the
/// confirmation does not match.
pub fn validate_password(password: &str, confirmation: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "La contraseña debe tener al menos {MIN_PASSWORD_LENGTH} caracteres"
        )));
    }
    if password != confirmation {
        return Err(AuthError::WeakPassword(
            "Las contraseñas no coinciden".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> AuthSession {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| Utc::now().timestamp() + self.expires_in.unwrap_or(3600));
        AuthSession {
            access_token: SecretString::from(self.access_token),
            refresh_token: SecretString::from(self.refresh_token),
            expires_at,
            user: self.user,
        }
    }
}

/// GoTrue has used several error shapes over time; all fields are optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiErrorBody {
    error: Option<String>,
    error_code: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl ApiErrorBody {
    fn message(&self) -> String {
        self.msg
            .clone()
            .or_else(|| self.error_description.clone())
            .or_else(|| self.message.clone())
            .or_else(|| self.error.clone())
            .unwrap_or_default()
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Map an error response to an [`AuthError`].
fn classify_error(status: u16, body: &str) -> AuthError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed.message();
    let code = parsed.error_code.as_deref().or(parsed.error.as_deref());

    if status == 429 || code == Some("over_email_send_rate_limit") || code == Some("over_request_rate_limit") {
        return AuthError::RateLimited;
    }

    match code {
        Some("user_already_exists" | "email_exists") => AuthError::UserAlreadyExists,
        Some("weak_password") => AuthError::WeakPassword(message),
        Some("email_not_confirmed") => AuthError::EmailNotConfirmed,
        Some("invalid_credentials" | "invalid_grant") => {
            if message.to_lowercase().contains("not confirmed") {
                AuthError::EmailNotConfirmed
            } else {
                AuthError::InvalidCredentials
            }
        }
        Some("otp_expired" | "flow_state_expired") => AuthError::LinkExpired,
        Some("session_not_found" | "refresh_token_not_found" | "bad_jwt") => {
            AuthError::SessionExpired
        }
        _ if status == 422 && message.to_lowercase().contains("already registered") => {
            AuthError::UserAlreadyExists
        }
        _ => AuthError::Api { status, message },
    }
}

// =============================================================================
// SupabaseAuthClient
// =============================================================================

/// Client for Supabase Auth.
#[derive(Clone)]
pub struct SupabaseAuthClient {
    inner: Arc<SupabaseAuthClientInner>,
}

struct SupabaseAuthClientInner {
    client: reqwest::Client,
    auth_url: String,
    anon_key: SecretString,
}

impl SupabaseAuthClient {
    /// Create a new auth client.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            inner: Arc::new(SupabaseAuthClientInner {
                client,
                auth_url: format!("{}/auth/v1", config.url.trim_end_matches('/')),
                anon_key: config.anon_key.clone(),
            }),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, format!("{}{path}", self.inner.auth_url))
            .header("apikey", self.inner.anon_key.expose_secret())
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, AuthError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let error = classify_error(status.as_u16(), &body);
        if matches!(error, AuthError::Api { .. }) {
            warn!(
                status = status.as_u16(),
                body = %body.chars().take(300).collect::<String>(),
                "Supabase Auth returned an unexpected error"
            );
        } else {
            debug!(error = %error, "Supabase Auth rejected request");
        }
        Err(error)
    }

    async fn send_for_session(&self, request: reqwest::RequestBuilder) -> Result<AuthSession, AuthError> {
        let body = self.send(request).await?;
        let tokens: TokenResponse = serde_json::from_str(&body).map_err(|e| AuthError::Api {
            status: 200,
            message: format!("unexpected token response: {e}"),
        })?;
        Ok(tokens.into_session())
    }

    /// Check that the auth API answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the health endpoint is unreachable or unhealthy.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<(), AuthError> {
        self.send(self.request(reqwest::Method::GET, "/health")).await?;
        Ok(())
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email is taken,
    /// `AuthError::WeakPassword` if Supabase rejects the password.
    #[instrument(skip(self, email, password))]
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        redirect_to: &str,
    ) -> Result<SignUpOutcome, AuthError> {
        let request = self
            .request(reqwest::Method::POST, "/signup")
            .query(&[("redirect_to", redirect_to)])
            .json(&Credentials {
                email: email.as_str(),
                password,
            });

        let body = self.send(request).await?;

        // Auto-confirming projects answer with tokens, others with the bare user
        match serde_json::from_str::<TokenResponse>(&body) {
            Ok(tokens) => Ok(SignUpOutcome::Session(tokens.into_session())),
            Err(_) => Ok(SignUpOutcome::ConfirmationRequired),
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a wrong email or password and
    /// `AuthError::EmailNotConfirmed` for unconfirmed accounts.
    #[instrument(skip(self, email, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let request = self
            .request(reqwest::Method::POST, "/token")
            .query(&[("grant_type", "password")])
            .json(&Credentials {
                email: email.as_str(),
                password,
            });
        self.send_for_session(request).await
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` if the refresh token was revoked or used.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let request = self
            .request(reqwest::Method::POST, "/token")
            .query(&[("grant_type", "refresh_token")])
            .json(&serde_json::json!({ "refresh_token": refresh_token }));

        self.send_for_session(request).await.map_err(|e| match e {
            AuthError::InvalidCredentials => AuthError::SessionExpired,
            other => other,
        })
    }

    /// Revoke the session's tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; an already expired token is not an error.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let request = self
            .request(reqwest::Method::POST, "/logout")
            .bearer_auth(access_token);

        match self.send(request).await {
            Ok(_) | Err(AuthError::SessionExpired) => Ok(()),
            Err(AuthError::Api { status: 401 | 403, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Email a password recovery link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RateLimited` if too many emails were requested.
    #[instrument(skip(self, email))]
    pub async fn send_password_reset(&self, email: &Email, redirect_to: &str) -> Result<(), AuthError> {
        let request = self
            .request(reqwest::Method::POST, "/recover")
            .query(&[("redirect_to", redirect_to)])
            .json(&serde_json::json!({ "email": email.as_str() }));
        self.send(request).await?;
        Ok(())
    }

    /// Resend the signup confirmation email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RateLimited` if too many emails were requested.
    #[instrument(skip(self, email))]
    pub async fn resend_confirmation(&self, email: &Email, redirect_to: &str) -> Result<(), AuthError> {
        let request = self
            .request(reqwest::Method::POST, "/resend")
            .query(&[("redirect_to", redirect_to)])
            .json(&serde_json::json!({ "type": "signup", "email": email.as_str() }));
        self.send(request).await?;
        Ok(())
    }

    /// Verify a `token_hash` from an email link and open a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::LinkExpired` if the link was used or has expired.
    #[instrument(skip(self, token_hash))]
    pub async fn verify_token_hash(
        &self,
        token_hash: &str,
        kind: VerifyKind,
    ) -> Result<AuthSession, AuthError> {
        let request = self
            .request(reqwest::Method::POST, "/verify")
            .json(&serde_json::json!({ "type": kind.as_str(), "token_hash": token_hash }));
        self.send_for_session(request).await
    }

    /// Set a new password for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if Supabase rejects the password.
    #[instrument(skip_all)]
    pub async fn update_password(&self, access_token: &str, new_password: &str) -> Result<(), AuthError> {
        let request = self
            .request(reqwest::Method::PUT, "/user")
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "password": new_password }));
        self.send(request).await?;
        Ok(())
    }

    /// Fetch the user behind an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` if the token is no longer valid.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let request = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(access_token);

        let body = self.send(request).await.map_err(|e| match e {
            AuthError::Api { status: 401 | 403, .. } => AuthError::SessionExpired,
            other => other,
        })?;

        serde_json::from_str(&body).map_err(|e| AuthError::Api {
            status: 200,
            message: format!("unexpected user response: {e}"),
        })
    }
}
