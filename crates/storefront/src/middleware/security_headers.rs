//! Security headers for every response.
//!
//! The CSP allows scripts from this origin, the HTMX CDN and inline blocks
//! carrying the request's nonce. Product images come from the WooCommerce
//! host, so `img-src` accepts any https origin.

use axum::{
    extract::Request,
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::CspNonce;

/// Origin serving the HTMX bundle.
pub const HTMX_ORIGIN: &str = "https://unpkg.com";

/// Build the Content-Security-Policy value.
#[must_use]
pub fn content_security_policy(nonce: Option<&CspNonce>) -> String {
    let mut script_src = format!("'self' {HTMX_ORIGIN}");
    if let Some(source) = nonce.and_then(CspNonce::source) {
        script_src.push(' ');
        script_src.push_str(&source);
    }

    [
        "default-src 'self'".to_string(),
        format!("script-src {script_src}"),
        "style-src 'self'".to_string(),
        "font-src 'self'".to_string(),
        "img-src 'self' data: https:".to_string(),
        "connect-src 'self'".to_string(),
        "frame-src 'none'".to_string(),
        "object-src 'none'".to_string(),
        "base-uri 'self'".to_string(),
        "form-action 'self'".to_string(),
        "frame-ancestors 'none'".to_string(),
        "upgrade-insecure-requests".to_string(),
    ]
    .join("; ")
}

fn apply_static_headers(headers: &mut HeaderMap) {
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), geolocation=(), microphone=(), payment=(), usb=(), interest-cohort=()",
        ),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
}

/// Add security headers to all responses.
///
/// Handlers that set their own `Cache-Control` (feeds, sitemaps) keep it;
/// everything else is marked `no-store`.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let nonce = request.extensions().get::<CspNonce>().cloned();
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    apply_static_headers(headers);

    if let Ok(csp) = HeaderValue::from_str(&content_security_policy(nonce.as_ref())) {
        headers.insert(CONTENT_SECURITY_POLICY, csp);
    }

    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    response
}
