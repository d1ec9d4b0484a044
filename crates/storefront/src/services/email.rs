//! Quote emails over SMTP.
//!
//! Uses lettre for delivery with Askama HTML and plain-text templates. Every
//! quote produces two messages: a confirmation to the customer and a
//! notification to the sales inbox with `Reply-To` set to the customer.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use impacto33_core::Price;

use crate::config::EmailConfig;
use crate::services::quote::ValidQuote;
use crate::site;

/// Quote data pre-formatted for the email templates.
struct QuoteView<'a> {
    quote: &'a ValidQuote,
    lines: Vec<(&'a str, i64, Option<String>)>,
    zones: String,
    unit_price: Option<String>,
    total_without_vat: Option<String>,
    vat_amount: Option<String>,
    total_with_vat: Option<String>,
}

impl<'a> QuoteView<'a> {
    fn new(quote: &'a ValidQuote) -> Self {
        let fmt = |d| Price::eur(d).display();
        Self {
            lines: quote
                .lines
                .iter()
                .map(|l| (l.size.as_str(), l.quantity, l.subtotal.map(fmt)))
                .collect(),
            zones: if quote.zones.is_empty() {
                "Sin personalización".to_string()
            } else {
                quote.zones.join(", ")
            },
            unit_price: quote.amounts.map(|a| fmt(a.unit_price)),
            total_without_vat: quote.amounts.map(|a| fmt(a.total_without_vat)),
            vat_amount: quote.amounts.map(|a| fmt(a.vat_amount)),
            total_with_vat: quote.amounts.map(|a| fmt(a.total_with_vat)),
            quote,
        }
    }
}

#[derive(Template)]
#[template(path = "emails/quote_customer.html")]
struct QuoteCustomerHtml<'a> {
    v: &'a QuoteView<'a>,
    brand: &'a str,
    whatsapp_url: &'a str,
}

#[derive(Template)]
#[template(path = "emails/quote_customer.txt")]
struct QuoteCustomerText<'a> {
    v: &'a QuoteView<'a>,
    brand: &'a str,
    whatsapp_url: &'a str,
}

#[derive(Template)]
#[template(path = "emails/quote_company.html")]
struct QuoteCompanyHtml<'a> {
    v: &'a QuoteView<'a>,
}

#[derive(Template)]
#[template(path = "emails/quote_company.txt")]
struct QuoteCompanyText<'a> {
    v: &'a QuoteView<'a>,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

fn mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}

/// Subject of the customer confirmation.
pub const CUSTOMER_SUBJECT: &str = "Hemos recibido tu solicitud de presupuesto - IMPACTO33";

/// Subject of the sales notification.
#[must_use]
pub fn company_subject(quote: &ValidQuote) -> String {
    format!("Nueva solicitud: {} - {}", quote.name, quote.product_name)
}

/// Email service for quote messages.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    company_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            company_address: config.company_address.clone(),
        })
    }

    /// Send the confirmation to the customer and the notification to sales.
    ///
    /// # Errors
    ///
    /// Returns error if either message fails to render or send.
    pub async fn send_quote(&self, quote: &ValidQuote) -> Result<(), EmailError> {
        let view = QuoteView::new(quote);
        self.send_quote_confirmation(&view).await?;
        self.send_quote_notification(&view).await
    }

    async fn send_quote_confirmation(&self, v: &QuoteView<'_>) -> Result<(), EmailError> {
        let whatsapp_url = site::whatsapp_link();
        let brand = site::BRAND_NAME;
        let html = QuoteCustomerHtml { v, brand, whatsapp_url: &whatsapp_url }.render()?;
        let text = QuoteCustomerText { v, brand, whatsapp_url: &whatsapp_url }.render()?;

        self.send_multipart_email(v.quote.email.as_str(), None, CUSTOMER_SUBJECT, &text, &html)
            .await
    }

    async fn send_quote_notification(&self, v: &QuoteView<'_>) -> Result<(), EmailError> {
        let html = QuoteCompanyHtml { v }.render()?;
        let text = QuoteCompanyText { v }.render()?;

        self.send_multipart_email(
            &self.company_address,
            Some(v.quote.email.as_str()),
            &company_subject(v.quote),
            &text,
            &html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        reply_to: Option<&str>,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let mut builder = Message::builder()
            .from(mailbox(&self.from_address)?)
            .to(mailbox(to)?)
            .subject(subject);
        if let Some(reply_to) = reply_to {
            builder = builder.reply_to(mailbox(reply_to)?);
        }

        let email = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text_body.to_string()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html_body.to_string()),
                ),
        )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::quote::QuoteRequest;

    fn quote() -> ValidQuote {
        let req: QuoteRequest = serde_json::from_value(serde_json::json!({
            "name": "Ana",
            "email": "ana@example.com",
            "company": "Acme",
            "message": "Logo a una tinta",
            "product": {
                "id": "42",
                "name": "Sudadera",
                "quantities": { "M": 25 },
                "selected_zones": ["espalda"]
            },
            "pricing": {
                "unit_price": 20.0,
                "total_without_vat": 500.0,
                "total_with_vat": 605.0,
                "total_quantity": 25
            }
        }))
        .unwrap();
        req.validate().unwrap()
    }

    #[test]
    fn test_company_subject() {
        assert_eq!(company_subject(&quote()), "Nueva solicitud: Ana - Sudadera");
    }

    #[test]
    fn test_customer_templates_render() {
        let q = quote();
        let v = QuoteView::new(&q);
        let html = QuoteCustomerHtml { v: &v, brand: "IMPACTO33", whatsapp_url: "https://wa.me/1" }
            .render()
            .unwrap();
        assert!(html.contains("Sudadera"));
        assert!(html.contains("605,00"));

        let text = QuoteCustomerText { v: &v, brand: "IMPACTO33", whatsapp_url: "https://wa.me/1" }
            .render()
            .unwrap();
        assert!(text.contains("Espalda"));
        assert!(text.contains("25"));
    }

    #[test]
    fn test_company_templates_render() {
        let q = quote();
        let v = QuoteView::new(&q);
        let html = QuoteCompanyHtml { v: &v }.render().unwrap();
        assert!(html.contains("ana@example.com"));
        assert!(html.contains("Acme"));

        let text = QuoteCompanyText { v: &v }.render().unwrap();
        assert!(text.contains("Logo a una tinta"));
    }

    #[test]
    fn test_view_without_zones() {
        let mut q = quote();
        q.zones.clear();
        q.amounts = None;
        let v = QuoteView::new(&q);
        assert_eq!(v.zones, "Sin personalización");
        assert!(v.total_with_vat.is_none());
    }
}
