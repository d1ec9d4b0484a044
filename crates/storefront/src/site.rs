//! Brand and contact details shared by every page.

/// Brand name.
pub const BRAND_NAME: &str = "IMPACTO33";

/// Canonical public URL (no trailing slash).
pub const SITE_URL: &str = "https://impacto33.com";

pub const CONTACT_EMAIL: &str = "info@impacto33.com";

/// Phone number in E.164 form.
pub const WHATSAPP_NUMBER: &str = "+34690906027";

pub const CONTACT_URL: &str = "/contacto";
pub const FAST_QUOTE_URL: &str = "/presupuesto-rapido";
pub const ADDRESS: &str = "Tienda online";
pub const BUSINESS_HOURS: &str = "Lunes-Viernes 9-14 hs y 15-18 hs";

pub const INSTAGRAM_URL: &str = "https://instagram.com/impacto33";
pub const FACEBOOK_URL: &str = "https://facebook.com/impacto33";
pub const LINKEDIN_URL: &str = "https://linkedin.com/company/impacto33";

pub const DEFAULT_META_TITLE: &str = "IMPACTO33 | Regalos Publicitarios y Ropa Personalizada";
pub const DEFAULT_META_DESCRIPTION: &str = "Especialistas en regalos de empresa, merchandising y ropa laboral personalizada. Venta al por mayor con los mejores precios y plazos de entrega.";
pub const LOCALE: &str = "es_ES";

/// `wa.me` link for the WhatsApp button.
#[must_use]
pub fn whatsapp_link() -> String {
    format!("https://wa.me/{}", WHATSAPP_NUMBER.trim_start_matches('+'))
}

/// Page title with the brand suffix, or the default title.
#[must_use]
pub fn page_title(title: Option<&str>) -> String {
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) if t.contains(BRAND_NAME) => t.to_string(),
        Some(t) => format!("{t} | {BRAND_NAME}"),
        None => DEFAULT_META_TITLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatsapp_link() {
        assert_eq!(whatsapp_link(), "https://wa.me/34690906027");
    }

    #[test]
    fn test_page_title() {
        assert_eq!(page_title(Some("Carrito")), "Carrito | IMPACTO33");
        assert_eq!(page_title(Some("IMPACTO33 | Inicio")), "IMPACTO33 | Inicio");
        assert_eq!(page_title(None), DEFAULT_META_TITLE);
        assert_eq!(page_title(Some("  ")), DEFAULT_META_TITLE);
    }
}
