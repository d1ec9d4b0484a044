//! Authentication route handlers.
//!
//! Login, registration, password recovery and email confirmation against
//! Supabase Auth. Email links land on `/auth/confirm?token_hash=...&type=...`;
//! the hash is verified server-side and opens a session.
//!
//! Form handlers never return errors: they redirect back with
//! `?error=<code>` and the page turns the code into a message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use impacto33_core::Email;

use crate::db::ProfileRepository;
use crate::filters;
use crate::middleware::{
    CspNonce, OptionalAuth, clear_current_user, start_user_session, take_return_to,
};
use crate::models::CurrentUser;
use crate::models::session::keys;
use crate::routes::layout::PageLayout;
use crate::services::auth::{AuthError, AuthSession, SignUpOutcome, VerifyKind, validate_password};
use crate::state::AppState;

const ACCOUNT_PATH: &str = "/mi-cuenta";
const ONBOARDING_PATH: &str = "/mi-perfil/onboarding";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Forgot password and resend confirmation form data.
#[derive(Debug, Deserialize)]
pub struct EmailForm {
    #[serde(default)]
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Query parameters of an email link.
#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub token_hash: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<VerifyKind>,
}

// =============================================================================
// Messages
// =============================================================================

/// User-facing text for an `?error=` code.
#[must_use]
pub fn error_message(code: &str) -> &'static str {
    match code {
        "invalid_email" => "El email no es válido.",
        "invalid_credentials" => "Email o contraseña incorrectos.",
        "email_not_confirmed" => {
            "Tu email todavía no está confirmado. Revisa tu bandeja de entrada o solicita un nuevo enlace."
        }
        "user_exists" => "Ya existe una cuenta con este email. Inicia sesión.",
        "weak_password" => "La contraseña debe tener al menos 6 caracteres y coincidir con la confirmación.",
        "password_mismatch" => "Las contraseñas no coinciden.",
        "rate_limited" => "Demasiados intentos. Espera unos minutos y vuelve a intentarlo.",
        "link_expired" => "El enlace ha caducado o ya se ha utilizado. Solicita uno nuevo.",
        "session_expired" => "Tu sesión ha caducado. Vuelve a iniciar sesión.",
        "missing_email" => "Indica tu email.",
        "order_empty" => "Este pedido no tiene productos que repetir.",
        _ => "Ha ocurrido un error. Inténtalo de nuevo.",
    }
}

/// User-facing text for a `?success=` code.
#[must_use]
pub fn success_message(code: &str) -> Option<&'static str> {
    match code {
        "confirmation_sent" => Some("Te hemos enviado un nuevo enlace de confirmación."),
        "reset_sent" => Some(
            "Si existe una cuenta con ese email, recibirás un enlace para restablecer la contraseña.",
        ),
        "password_updated" => Some("Contraseña actualizada."),
        "email_confirmed" => Some("Email confirmado. ¡Bienvenido!"),
        "logged_out" => Some("Has cerrado sesión."),
        "profile_updated" => Some("Preferencias guardadas."),
        "onboarding_saved" => Some("¡Gracias! Usaremos tus respuestas para ayudarte mejor."),
        "wishlist_cleared" => Some("Tu lista de favoritos está vacía."),
        "order_repeated" => Some("Hemos añadido los productos del pedido a tu carrito."),
        _ => None,
    }
}

/// Messages resolved from the query string.
#[derive(Debug, Default, Clone)]
pub struct Flash {
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

impl From<&MessageQuery> for Flash {
    fn from(query: &MessageQuery) -> Self {
        Self {
            error: query.error.as_deref().map(error_message),
            success: query.success.as_deref().and_then(success_message),
        }
    }
}

fn redirect_with_error(path: &str, code: &str) -> Response {
    Redirect::to(&format!("{path}?error={code}")).into_response()
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: PageLayout,
    pub flash: Flash,
    pub show_resend: bool,
    pub pending_email: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: PageLayout,
    pub flash: Flash,
}

/// Shown after sign-up when the account must be confirmed by email.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register_success.html")]
pub struct RegisterSuccessTemplate {
    pub layout: PageLayout,
    pub email: String,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub layout: PageLayout,
    pub flash: Flash,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub layout: PageLayout,
    pub flash: Flash,
}

// =============================================================================
// Session helpers
// =============================================================================

/// Store the Supabase session and make sure a profile row exists.
async fn sign_in_user(
    state: &AppState,
    session: &Session,
    auth: &AuthSession,
    email: &Email,
) -> Result<CurrentUser, tower_sessions::session::Error> {
    let user = CurrentUser::from_auth_session(auth, email);
    start_user_session(session, &user).await?;
    let _ = session
        .remove::<String>(keys::PENDING_CONFIRMATION_EMAIL)
        .await;

    if let Err(e) = ProfileRepository::new(state.pool())
        .get_or_create(user.id, &user.email)
        .await
    {
        tracing::error!(error = %e, user_id = %user.id, "Failed to ensure user profile");
    }

    Ok(user)
}

async fn pending_email(session: &Session) -> Option<String> {
    session
        .get::<String>(keys::PENDING_CONFIRMATION_EMAIL)
        .await
        .ok()
        .flatten()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(session, nonce, user))]
pub async fn login_page(
    session: Session,
    nonce: CspNonce,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to(ACCOUNT_PATH).into_response();
    }

    let pending = pending_email(&session).await;
    LoginTemplate {
        layout: PageLayout::new(nonce, Some("Iniciar sesión")).private(),
        show_resend: query.error.as_deref() == Some("email_not_confirmed") || pending.is_some(),
        pending_email: pending.unwrap_or_default(),
        flash: Flash::from(&query),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let Ok(email) = Email::parse(&form.email) else {
        return redirect_with_error("/auth/login", "invalid_email");
    };

    match state.auth().sign_in_with_password(&email, &form.password).await {
        Ok(auth) => {
            if let Err(e) = sign_in_user(&state, &session, &auth, &email).await {
                tracing::error!(error = %e, "Failed to store session after login");
                return redirect_with_error("/auth/login", "server");
            }
            tracing::info!(user_id = %auth.user.id, "User logged in");
            let target = take_return_to(&session)
                .await
                .unwrap_or_else(|| ACCOUNT_PATH.to_string());
            Redirect::to(&target).into_response()
        }
        Err(AuthError::EmailNotConfirmed) => {
            let _ = session
                .insert(keys::PENDING_CONFIRMATION_EMAIL, email.as_str())
                .await;
            redirect_with_error("/auth/login", "email_not_confirmed")
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            redirect_with_error("/auth/login", e.code())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(nonce, user))]
pub async fn register_page(
    nonce: CspNonce,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to(ACCOUNT_PATH).into_response();
    }
    RegisterTemplate {
        layout: PageLayout::new(nonce, Some("Crear cuenta")).private(),
        flash: Flash::from(&query),
    }
    .into_response()
}

/// Handle registration form submission.
///
/// Projects that auto-confirm sign the user in straight away and send them
/// to onboarding; otherwise a confirmation email is pending.
#[instrument(skip(state, session, nonce, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    Form(form): Form<RegisterForm>,
) -> Response {
    let Ok(email) = Email::parse(&form.email) else {
        return redirect_with_error("/auth/register", "invalid_email");
    };
    if let Err(e) = validate_password(&form.password, &form.password_confirm) {
        return redirect_with_error("/auth/register", e.code());
    }

    let redirect_to = state.config().absolute_url("/auth/confirm");
    match state.auth().sign_up(&email, &form.password, &redirect_to).await {
        Ok(SignUpOutcome::Session(auth)) => {
            if let Err(e) = sign_in_user(&state, &session, &auth, &email).await {
                tracing::error!(error = %e, "Failed to store session after sign-up");
                return redirect_with_error("/auth/login", "server");
            }
            tracing::info!(user_id = %auth.user.id, "User registered");
            Redirect::to(ONBOARDING_PATH).into_response()
        }
        Ok(SignUpOutcome::ConfirmationRequired) => {
            let _ = session
                .insert(keys::PENDING_CONFIRMATION_EMAIL, email.as_str())
                .await;
            tracing::info!("User registered, confirmation pending");
            RegisterSuccessTemplate {
                layout: PageLayout::new(nonce, Some("Confirma tu email")).private(),
                email: email.into_inner(),
            }
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            redirect_with_error("/auth/register", e.code())
        }
    }
}

/// Send a new confirmation email.
#[instrument(skip(state, session, form))]
pub async fn resend_confirmation(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<EmailForm>,
) -> Response {
    let raw = if form.email.trim().is_empty() {
        pending_email(&session).await.unwrap_or_default()
    } else {
        form.email
    };
    if raw.trim().is_empty() {
        return redirect_with_error("/auth/login", "missing_email");
    }
    let Ok(email) = Email::parse(&raw) else {
        return redirect_with_error("/auth/login", "invalid_email");
    };

    let redirect_to = state.config().absolute_url("/auth/confirm");
    match state.auth().resend_confirmation(&email, &redirect_to).await {
        Ok(()) => Redirect::to("/auth/login?success=confirmation_sent").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Resending confirmation failed");
            redirect_with_error("/auth/login", e.code())
        }
    }
}

// =============================================================================
// Email links
// =============================================================================

/// Verify an email link and open a session.
///
/// Recovery links continue to the new-password form; sign-up and email
/// change links go to onboarding.
#[instrument(skip(state, session, query))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ConfirmQuery>,
) -> Response {
    let (Some(token_hash), Some(kind)) = (query.token_hash, query.kind) else {
        return redirect_with_error("/auth/login", "link_expired");
    };

    let auth = match state.auth().verify_token_hash(&token_hash, kind).await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::warn!(error = %e, kind = kind.as_str(), "Email link verification failed");
            let target = if kind == VerifyKind::Recovery {
                "/auth/forgot-password"
            } else {
                "/auth/login"
            };
            return redirect_with_error(target, e.code());
        }
    };

    let Some(email) = auth.user.email.as_deref().and_then(|e| Email::parse(e).ok()) else {
        tracing::error!(user_id = %auth.user.id, "Verified user has no usable email");
        return redirect_with_error("/auth/login", "server");
    };

    if let Err(e) = sign_in_user(&state, &session, &auth, &email).await {
        tracing::error!(error = %e, "Failed to store session after verification");
        return redirect_with_error("/auth/login", "server");
    }

    match kind {
        VerifyKind::Recovery => Redirect::to("/auth/reset-password").into_response(),
        VerifyKind::Signup | VerifyKind::Email => {
            Redirect::to(&format!("{ONBOARDING_PATH}?success=email_confirmed")).into_response()
        }
    }
}

// =============================================================================
// Password Recovery
// =============================================================================

/// Display the forgot password page.
#[instrument(skip(nonce))]
pub async fn forgot_password_page(nonce: CspNonce, Query(query): Query<MessageQuery>) -> impl IntoResponse {
    ForgotPasswordTemplate {
        layout: PageLayout::new(nonce, Some("Recuperar contraseña")).private(),
        flash: Flash::from(&query),
    }
}

/// Send a recovery email.
///
/// Always reports success for valid addresses so the form cannot be used to
/// probe which emails have accounts.
#[instrument(skip(state, form))]
pub async fn forgot_password(State(state): State<AppState>, Form(form): Form<EmailForm>) -> Response {
    let Ok(email) = Email::parse(&form.email) else {
        return redirect_with_error("/auth/forgot-password", "invalid_email");
    };

    let redirect_to = state.config().absolute_url("/auth/confirm");
    match state.auth().send_password_reset(&email, &redirect_to).await {
        Ok(()) => {}
        Err(AuthError::RateLimited) => {
            return redirect_with_error("/auth/forgot-password", "rate_limited");
        }
        Err(e) => tracing::warn!(error = %e, "Password reset request failed"),
    }

    Redirect::to("/auth/forgot-password?success=reset_sent").into_response()
}

/// Display the new-password form. Requires the session opened by a recovery link.
#[instrument(skip(nonce, user))]
pub async fn reset_password_page(
    nonce: CspNonce,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_none() {
        return redirect_with_error("/auth/forgot-password", "link_expired");
    }
    ResetPasswordTemplate {
        layout: PageLayout::new(nonce, Some("Nueva contraseña")).private(),
        flash: Flash::from(&query),
    }
    .into_response()
}

/// Set the new password.
#[instrument(skip(state, user, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let Some(user) = user else {
        return redirect_with_error("/auth/forgot-password", "link_expired");
    };
    if let Err(e) = validate_password(&form.password, &form.password_confirm) {
        return redirect_with_error("/auth/reset-password", e.code());
    }

    match state
        .auth()
        .update_password(&user.access_token, &form.password)
        .await
    {
        Ok(()) => {
            tracing::info!(user_id = %user.id, "Password reset");
            Redirect::to(&format!("{ACCOUNT_PATH}?success=password_updated")).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Password reset failed");
            redirect_with_error("/auth/reset-password", e.code())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out locally and revoke the refresh token at Supabase.
#[instrument(skip(state, session, user))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Response {
    if let Some(user) = user {
        if let Err(e) = state.auth().sign_out(&user.access_token).await {
            tracing::debug!(error = %e, "Supabase sign-out failed");
        }
        tracing::info!(user_id = %user.id, "User logged out");
    }

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }
    let _ = session.flush().await;

    Redirect::to("/").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_auth_error_code_has_a_message() {
        for code in [
            "invalid_email",
            "invalid_credentials",
            "email_not_confirmed",
            "user_exists",
            "weak_password",
            "rate_limited",
            "link_expired",
            "session_expired",
        ] {
            assert_ne!(error_message(code), error_message("server"), "{code}");
        }
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(error_message("nope"), error_message("server"));
        assert_eq!(success_message("nope"), None);
    }

    #[test]
    fn test_flash_from_query() {
        let query = MessageQuery {
            error: Some("invalid_credentials".to_string()),
            success: Some("reset_sent".to_string()),
        };
        let flash = Flash::from(&query);
        assert_eq!(flash.error, Some("Email o contraseña incorrectos."));
        assert!(flash.success.is_some_and(|s| s.contains("enlace")));
    }
}
