//! Data every full page hands to `base.html`.

use crate::middleware::CspNonce;
use crate::models::CurrentUser;
use crate::site;

/// Head metadata, the CSP nonce and the signed-in user for the page shell.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub nonce: String,
    pub title: String,
    pub description: String,
    pub canonical: Option<String>,
    pub user_email: Option<String>,
    pub noindex: bool,
}

impl PageLayout {
    /// Layout with the default description. `title` gets the brand suffix.
    #[must_use]
    pub fn new(nonce: CspNonce, title: Option<&str>) -> Self {
        Self {
            nonce: nonce.0,
            title: site::page_title(title),
            description: site::DEFAULT_META_DESCRIPTION.to_string(),
            canonical: None,
            user_email: None,
            noindex: false,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        let description = description.trim();
        if !description.is_empty() {
            self.description = description.to_string();
        }
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: Option<&CurrentUser>) -> Self {
        self.user_email = user.map(|u| u.email.to_string());
        self
    }

    #[must_use]
    pub fn with_canonical(mut self, url: String) -> Self {
        self.canonical = Some(url);
        self
    }

    /// Keep account, cart and auth pages out of search engines.
    #[must_use]
    pub const fn private(mut self) -> Self {
        self.noindex = true;
        self
    }

    pub const fn is_logged_in(&self) -> bool {
        self.user_email.is_some()
    }

    pub const fn brand(&self) -> &'static str {
        site::BRAND_NAME
    }

    pub const fn locale(&self) -> &'static str {
        site::LOCALE
    }

    pub const fn contact_email(&self) -> &'static str {
        site::CONTACT_EMAIL
    }

    pub const fn contact_url(&self) -> &'static str {
        site::CONTACT_URL
    }

    pub const fn address(&self) -> &'static str {
        site::ADDRESS
    }

    pub const fn phone(&self) -> &'static str {
        site::WHATSAPP_NUMBER
    }

    pub const fn business_hours(&self) -> &'static str {
        site::BUSINESS_HOURS
    }

    pub fn whatsapp_url(&self) -> String {
        site::whatsapp_link()
    }

    pub const fn instagram_url(&self) -> &'static str {
        site::INSTAGRAM_URL
    }

    pub const fn facebook_url(&self) -> &'static str {
        site::FACEBOOK_URL
    }

    pub const fn linkedin_url(&self) -> &'static str {
        site::LINKEDIN_URL
    }

    pub const fn quote_url(&self) -> &'static str {
        site::FAST_QUOTE_URL
    }
}
