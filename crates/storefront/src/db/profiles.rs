//! Profile and onboarding repository (`user_personalization`).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use impacto33_core::{CompanyType, Email, MerchUsage, OrderVolume, UserId};

use super::RepositoryError;
use crate::models::{OnboardingAnswers, OnboardingStatus, UserProfile};

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    supabase_user_id: UserId,
    email: Email,
    woo_customer_id: Option<i32>,
    is_newsletter_subscribed: bool,
    newsletter_consent_at: Option<DateTime<Utc>>,
    newsletter_source: Option<String>,
    #[sqlx(flatten)]
    onboarding: OnboardingRow,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            supabase_user_id: row.supabase_user_id,
            email: row.email,
            woo_customer_id: row.woo_customer_id,
            is_newsletter_subscribed: row.is_newsletter_subscribed,
            newsletter_consent_at: row.newsletter_consent_at,
            newsletter_source: row.newsletter_source,
            onboarding: row.onboarding.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OnboardingRow {
    profile_onboarding_completed: bool,
    company_type: Option<CompanyType>,
    merch_usage: Option<MerchUsage>,
    order_volume: Option<OrderVolume>,
    priority_focus: Vec<String>,
    extra_notes: Option<String>,
}

impl From<OnboardingRow> for OnboardingStatus {
    fn from(row: OnboardingRow) -> Self {
        Self {
            completed: row.profile_onboarding_completed,
            answers: OnboardingAnswers {
                company_type: row.company_type,
                merch_usage: row.merch_usage,
                order_volume: row.order_volume,
                priority_focus: row.priority_focus,
                extra_notes: row.extra_notes,
            },
        }
    }
}

/// Repository for customer profile operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the user's profile, creating it on first access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self, user_id: UserId, email: &Email) -> Result<UserProfile, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO public.user_personalization (supabase_user_id, email)
            VALUES ($1, $2)
            ON CONFLICT (supabase_user_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(email)
        .execute(self.pool)
        .await?;

        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT supabase_user_id, email, woo_customer_id, is_newsletter_subscribed,
                   newsletter_consent_at, newsletter_source, profile_onboarding_completed,
                   company_type, merch_usage, order_volume, priority_focus, extra_notes,
                   created_at, updated_at
            FROM public.user_personalization
            WHERE supabase_user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Subscribe or unsubscribe from the newsletter.
    ///
    /// Subscribing records the consent time and source; unsubscribing clears both.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn update_newsletter(
        &self,
        user_id: UserId,
        subscribed: bool,
        source: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE public.user_personalization
            SET is_newsletter_subscribed = $2,
                newsletter_consent_at = CASE WHEN $2 THEN NOW() ELSE NULL END,
                newsletter_source = CASE WHEN $2 THEN $3 ELSE NULL END,
                updated_at = NOW()
            WHERE supabase_user_id = $1
            ",
        )
        .bind(user_id)
        .bind(subscribed)
        .bind(source)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Onboarding state; a user without a profile has not completed it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_onboarding_status(&self, user_id: UserId) -> Result<OnboardingStatus, RepositoryError> {
        let row = sqlx::query_as::<_, OnboardingRow>(
            r"
            SELECT profile_onboarding_completed, company_type, merch_usage, order_volume,
                   priority_focus, extra_notes
            FROM public.user_personalization
            WHERE supabase_user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into).unwrap_or_default())
    }

    /// Store the questionnaire answers and mark onboarding complete.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn save_onboarding(&self, user_id: UserId, answers: &OnboardingAnswers) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE public.user_personalization
            SET company_type = $2, merch_usage = $3, order_volume = $4,
                priority_focus = $5, extra_notes = $6,
                profile_onboarding_completed = TRUE, updated_at = NOW()
            WHERE supabase_user_id = $1
            ",
        )
        .bind(user_id)
        .bind(answers.company_type)
        .bind(answers.merch_usage)
        .bind(answers.order_volume)
        .bind(&answers.priority_focus)
        .bind(&answers.extra_notes)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Mark onboarding complete without answers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn skip_onboarding(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE public.user_personalization
            SET profile_onboarding_completed = TRUE, updated_at = NOW()
            WHERE supabase_user_id = $1
            ",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
