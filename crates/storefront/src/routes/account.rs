//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use impacto33_core::{CompanyType, MerchUsage, OrderVolume, ProductId};

use crate::db::{
    OrderRepository, ProfileRepository, RECENT_VIEWED_LIMIT, ViewedProductRepository,
    WishlistRepository,
};
use crate::error::Result;
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::models::profile::{NEWSLETTER_SOURCE_PROFILE, PRIORITY_FOCUS_OPTIONS, sanitize_priority_focus};
use crate::models::{OnboardingAnswers, OrderSummary, UserProfile};
use crate::routes::auth::{Flash, MessageQuery};
use crate::routes::form::FormPairs;
use crate::routes::layout::PageLayout;
use crate::routes::views::{ProductCard, cards_in_order};
use crate::services::auth::validate_password;
use crate::state::AppState;

/// Orders shown on the dashboard.
const DASHBOARD_ORDERS: i64 = 3;

/// Wishlist products shown on the dashboard.
const DASHBOARD_WISHLIST: i64 = 4;

// =============================================================================
// View types
// =============================================================================

/// Order row for listings.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub number: String,
    pub date: String,
    pub status: &'static str,
    pub total: String,
    pub items_count: i64,
}

impl From<&OrderSummary> for OrderRow {
    fn from(summary: &OrderSummary) -> Self {
        let order = &summary.order;
        Self {
            id: order.id.to_string(),
            number: order.order_number.clone(),
            date: order.created_at.format("%d/%m/%Y").to_string(),
            status: order.status.label(),
            total: crate::pricing::format_euro(order.total),
            items_count: summary.items_count,
        }
    }
}

/// One select option for onboarding questions.
#[derive(Debug, Clone)]
pub struct ChoiceView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn choices<T: Copy + PartialEq>(
    all: &[T],
    current: Option<T>,
    value: impl Fn(T) -> &'static str,
    label: impl Fn(T) -> &'static str,
) -> Vec<ChoiceView> {
    all.iter()
        .map(|item| ChoiceView {
            value: value(*item),
            label: label(*item),
            selected: current == Some(*item),
        })
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Account dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub layout: PageLayout,
    pub flash: Flash,
    pub email: String,
    pub onboarding_pending: bool,
    pub recent_orders: Vec<OrderRow>,
    pub viewed: Vec<ProductCard>,
    pub wishlist: Vec<ProductCard>,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub layout: PageLayout,
    pub flash: Flash,
    pub email: String,
    pub newsletter: bool,
    pub member_since: String,
    pub onboarding_completed: bool,
}

/// Onboarding questionnaire template.
#[derive(Template, WebTemplate)]
#[template(path = "account/onboarding.html")]
pub struct OnboardingTemplate {
    pub layout: PageLayout,
    pub flash: Flash,
    pub company_types: Vec<ChoiceView>,
    pub merch_usages: Vec<ChoiceView>,
    pub order_volumes: Vec<ChoiceView>,
    pub priorities: Vec<ChoiceView>,
    pub extra_notes: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// Hydrate product ids into cards; the catalog being down leaves the list empty.
async fn product_cards(state: &AppState, ids: &[ProductId]) -> Vec<ProductCard> {
    if ids.is_empty() {
        return Vec::new();
    }
    match state.catalog().get_products_by_ids(ids).await {
        Ok(products) => cards_in_order(ids, &products),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load products for account page");
            Vec::new()
        }
    }
}

fn redirect_with(path: &str, key: &str, code: &str) -> Response {
    Redirect::to(&format!("{path}?{key}={code}")).into_response()
}

// =============================================================================
// Dashboard
// =============================================================================

/// Display the account dashboard.
#[instrument(skip(state, nonce, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    nonce: CspNonce,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let profile = ProfileRepository::new(state.pool())
        .get_or_create(user.id, &user.email)
        .await?;
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id, DASHBOARD_ORDERS)
        .await?;

    let viewed_ids: Vec<ProductId> = ViewedProductRepository::new(state.pool())
        .recent(user.id, RECENT_VIEWED_LIMIT)
        .await?
        .into_iter()
        .map(|v| v.product_id)
        .collect();
    let wishlist_ids = WishlistRepository::new(state.pool())
        .product_ids(user.id, Some(DASHBOARD_WISHLIST))
        .await?;

    let (viewed, wishlist) = tokio::join!(
        product_cards(&state, &viewed_ids),
        product_cards(&state, &wishlist_ids),
    );

    Ok(AccountIndexTemplate {
        layout: PageLayout::new(nonce, Some("Mi cuenta"))
            .with_user(Some(&user))
            .private(),
        flash: Flash::from(&query),
        email: user.email.to_string(),
        onboarding_pending: !profile.onboarding.completed,
        recent_orders: orders.iter().map(OrderRow::from).collect(),
        viewed,
        wishlist,
    })
}

// =============================================================================
// Profile
// =============================================================================

/// Profile preferences form.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub newsletter: Option<String>,
}

/// Change password form.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    pub password: String,
    pub password_confirm: String,
}

fn profile_template(
    nonce: CspNonce,
    user: &crate::models::CurrentUser,
    profile: &UserProfile,
    flash: Flash,
) -> ProfileTemplate {
    ProfileTemplate {
        layout: PageLayout::new(nonce, Some("Mi perfil"))
            .with_user(Some(user))
            .private(),
        flash,
        email: profile.email.to_string(),
        newsletter: profile.is_newsletter_subscribed,
        member_since: profile.created_at.format("%d/%m/%Y").to_string(),
        onboarding_completed: profile.onboarding.completed,
    }
}

/// Display the profile page.
#[instrument(skip(state, nonce, user), fields(user_id = %user.id))]
pub async fn profile(
    State(state): State<AppState>,
    nonce: CspNonce,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let profile = ProfileRepository::new(state.pool())
        .get_or_create(user.id, &user.email)
        .await?;
    Ok(profile_template(nonce, &user, &profile, Flash::from(&query)))
}

/// Save profile preferences.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let subscribed = form
        .newsletter
        .as_deref()
        .is_some_and(|v| matches!(v, "on" | "true" | "1"));

    let repo = ProfileRepository::new(state.pool());
    repo.get_or_create(user.id, &user.email).await?;
    repo.update_newsletter(user.id, subscribed, NEWSLETTER_SOURCE_PROFILE)
        .await?;

    tracing::info!(subscribed, "Newsletter preference updated");
    Ok(redirect_with("/mi-perfil", "success", "profile_updated"))
}

/// Change the password of the signed-in user.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    if let Err(e) = validate_password(&form.password, &form.password_confirm) {
        return redirect_with("/mi-perfil", "error", e.code());
    }

    match state
        .auth()
        .update_password(&user.access_token, &form.password)
        .await
    {
        Ok(()) => {
            tracing::info!("Password changed");
            redirect_with("/mi-perfil", "success", "password_updated")
        }
        Err(e) => {
            tracing::warn!(error = %e, "Password change failed");
            redirect_with("/mi-perfil", "error", e.code())
        }
    }
}

// =============================================================================
// Onboarding
// =============================================================================

/// Display the onboarding questionnaire with any saved answers.
#[instrument(skip(state, nonce, user), fields(user_id = %user.id))]
pub async fn onboarding_page(
    State(state): State<AppState>,
    nonce: CspNonce,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let repo = ProfileRepository::new(state.pool());
    repo.get_or_create(user.id, &user.email).await?;
    let answers = repo.get_onboarding_status(user.id).await?.answers;

    Ok(OnboardingTemplate {
        layout: PageLayout::new(nonce, Some("Cuéntanos sobre tu empresa"))
            .with_user(Some(&user))
            .private(),
        flash: Flash::from(&query),
        company_types: choices(CompanyType::ALL, answers.company_type, CompanyType::as_str, CompanyType::label),
        merch_usages: choices(MerchUsage::ALL, answers.merch_usage, MerchUsage::as_str, MerchUsage::label),
        order_volumes: choices(OrderVolume::ALL, answers.order_volume, OrderVolume::as_str, OrderVolume::label),
        priorities: PRIORITY_FOCUS_OPTIONS
            .iter()
            .map(|(value, label)| ChoiceView {
                value,
                label,
                selected: answers.priority_focus.iter().any(|p| p == value),
            })
            .collect(),
        extra_notes: answers.extra_notes.unwrap_or_default(),
    })
}

/// Read questionnaire answers from the raw form. Unknown values are dropped.
#[must_use]
pub fn parse_onboarding(pairs: &[(String, String)]) -> OnboardingAnswers {
    let form = FormPairs(pairs);
    OnboardingAnswers {
        company_type: form.first("company_type").and_then(|v| v.parse().ok()),
        merch_usage: form.first("merch_usage").and_then(|v| v.parse().ok()),
        order_volume: form.first("order_volume").and_then(|v| v.parse().ok()),
        priority_focus: sanitize_priority_focus(&form.all("priority_focus")),
        extra_notes: form
            .first("extra_notes")
            .map(|notes| notes.chars().take(1000).collect()),
    }
}

/// Save the questionnaire and go to the dashboard.
#[instrument(skip(state, user, pairs), fields(user_id = %user.id))]
pub async fn save_onboarding(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let answers = parse_onboarding(&pairs);
    let repo = ProfileRepository::new(state.pool());
    repo.get_or_create(user.id, &user.email).await?;
    repo.save_onboarding(user.id, &answers).await?;

    tracing::info!("Onboarding completed");
    Ok(redirect_with("/mi-cuenta", "success", "onboarding_saved"))
}

/// Mark onboarding as done without answers.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn skip_onboarding(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let repo = ProfileRepository::new(state.pool());
    repo.get_or_create(user.id, &user.email).await?;
    repo.skip_onboarding(user.id).await?;
    Ok(Redirect::to("/mi-cuenta").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_onboarding() {
        let company = CompanyType::ALL[0];
        let raw = pairs(&[
            ("company_type", company.as_str()),
            ("merch_usage", "no-such-usage"),
            ("priority_focus", "quality"),
            ("priority_focus", "bogus"),
            ("priority_focus", "price"),
            ("extra_notes", "  Necesitamos 200 polos  "),
        ]);
        let answers = parse_onboarding(&raw);

        assert_eq!(answers.company_type, Some(company));
        assert_eq!(answers.merch_usage, None);
        assert_eq!(answers.order_volume, None);
        assert_eq!(answers.priority_focus, vec!["quality", "price"]);
        assert_eq!(answers.extra_notes.as_deref(), Some("Necesitamos 200 polos"));
    }

    #[test]
    fn test_choices_marks_selected() {
        let current = OrderVolume::ALL.last().copied();
        let views = choices(OrderVolume::ALL, current, OrderVolume::as_str, OrderVolume::label);
        assert_eq!(views.len(), OrderVolume::ALL.len());
        assert_eq!(views.iter().filter(|c| c.selected).count(), 1);
        assert!(views.last().is_some_and(|c| c.selected));
    }
}
