//! Customer profile and onboarding types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use impacto33_core::{CompanyType, Email, MerchUsage, OrderVolume, UserId};

/// Where a newsletter subscription came from.
pub const NEWSLETTER_SOURCE_PROFILE: &str = "profile";

/// Storefront-side profile keyed by the Supabase user id.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub supabase_user_id: UserId,
    pub email: Email,
    /// Matching WooCommerce customer, when one was linked.
    pub woo_customer_id: Option<i32>,
    pub is_newsletter_subscribed: bool,
    pub newsletter_consent_at: Option<DateTime<Utc>>,
    pub newsletter_source: Option<String>,
    pub onboarding: OnboardingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Answers to the onboarding questionnaire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OnboardingAnswers {
    pub company_type: Option<CompanyType>,
    pub merch_usage: Option<MerchUsage>,
    pub order_volume: Option<OrderVolume>,
    pub priority_focus: Vec<String>,
    pub extra_notes: Option<String>,
}

/// Whether onboarding is done, plus the answers given so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OnboardingStatus {
    pub completed: bool,
    pub answers: OnboardingAnswers,
}

/// Priorities a customer can pick during onboarding (value, label).
pub const PRIORITY_FOCUS_OPTIONS: &[(&str, &str)] = &[
    ("price", "Precio"),
    ("quality", "Calidad"),
    ("speed", "Plazo de entrega"),
    ("sustainability", "Sostenibilidad"),
    ("design", "Diseño y asesoramiento"),
];

/// Keep only known priority values, in the order given, without duplicates.
#[must_use]
pub fn sanitize_priority_focus(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let known = PRIORITY_FOCUS_OPTIONS.iter().any(|(v, _)| v == value);
        if known && !out.contains(value) {
            out.push(value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_priority_focus() {
        let input = vec![
            "speed".to_string(),
            "unknown".to_string(),
            "price".to_string(),
            "speed".to_string(),
        ];
        assert_eq!(sanitize_priority_focus(&input), vec!["speed", "price"]);
    }
}
