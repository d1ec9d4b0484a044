//! Authentication extractors.
//!
//! The signed-in user lives in the session as a [`CurrentUser`] holding the
//! Supabase tokens. Both extractors refresh the access token when it is about
//! to expire; if the refresh fails for any reason the user is logged out.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::CurrentUser;
use crate::models::session::keys;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// Page requests are redirected to the login page (remembering where to come
/// back to); `/api/` and HTMX requests get a 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hola, {}", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection when authentication is required but missing.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Ask HTMX to navigate to the login page.
    HtmxRedirect,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::HtmxRedirect => (
                StatusCode::UNAUTHORIZED,
                [("HX-Redirect", HeaderValue::from_static(LOGIN_PATH))],
            )
                .into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

const LOGIN_PATH: &str = "/auth/login";

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}

fn rejection_for(parts: &Parts) -> AuthRejection {
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Unauthorized
    } else if is_htmx(&parts.headers) {
        AuthRejection::HtmxRedirect
    } else {
        AuthRejection::RedirectToLogin
    }
}

/// Load the user from the session, refreshing the access token if needed.
///
/// Returns `None` when nobody is signed in or the session could not be
/// refreshed, in which case the user is also removed from the session.
async fn load_user(session: &Session, state: &AppState) -> Option<CurrentUser> {
    let user: CurrentUser = session.get(keys::CURRENT_USER).await.ok().flatten()?;

    if !user.needs_refresh() {
        return Some(user);
    }

    match state.auth().refresh_session(&user.refresh_token).await {
        Ok(fresh) => {
            let refreshed = CurrentUser::from_auth_session(&fresh, &user.email);
            if let Err(e) = set_current_user(session, &refreshed).await {
                tracing::warn!(error = %e, "Failed to store refreshed session");
            }
            tracing::debug!(user_id = %refreshed.id, "Access token refreshed");
            Some(refreshed)
        }
        Err(e) => {
            sign_out_after_failed_refresh(session, &user, &e).await;
            None
        }
    }
}

/// A stale access token is never served: drop the user whatever the cause.
async fn sign_out_after_failed_refresh(session: &Session, user: &CurrentUser, error: &AuthError) {
    match error {
        AuthError::SessionExpired | AuthError::InvalidCredentials => {
            tracing::info!(user_id = %user.id, "Refresh token rejected, signing out");
        }
        other => {
            tracing::warn!(user_id = %user.id, error = %other, "Token refresh failed, signing out");
        }
    }
    if let Err(e) = clear_current_user(session).await {
        tracing::warn!(error = %e, "Failed to clear session after refresh failure");
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::Unauthorized)?;

        if let Some(user) = load_user(&session, state).await {
            set_sentry_user(&user.id, Some(user.email.as_str()));
            return Ok(Self(user));
        }

        // Remember the page so login can send the user back
        if parts.method == axum::http::Method::GET && !is_htmx(&parts.headers) {
            let return_to = parts
                .uri
                .path_and_query()
                .map_or("/mi-cuenta", |pq| pq.as_str())
                .to_string();
            let _ = session.insert(keys::RETURN_TO, return_to).await;
        }

        Err(rejection_for(parts))
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireAuth`, this never rejects the request.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>().cloned() {
            Some(session) => load_user(&session, state).await,
            None => None,
        };
        Ok(Self(user))
    }
}

/// Store the signed-in user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CURRENT_USER, user).await
}

/// Sign in: rotate the session id, store the user and tag Sentry.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn start_user_session(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    set_current_user(session, user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Remove the user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(keys::CURRENT_USER).await?;
    clear_sentry_user();
    Ok(())
}

/// Take the remembered return path, accepting only local paths.
pub async fn take_return_to(session: &Session) -> Option<String> {
    let path: String = session.remove(keys::RETURN_TO).await.ok().flatten()?;
    is_local_path(&path).then_some(path)
}

/// Whether `path` stays on this site (no scheme, no protocol-relative `//`).
#[must_use]
pub fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}
