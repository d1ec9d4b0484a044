//! Per-request CSP nonce.
//!
//! Inline `<script>` blocks in templates carry `nonce="{{ nonce }}"`; the same
//! value is added to the `script-src` directive by the security headers
//! middleware.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// A 128-bit random nonce, base64-encoded.
#[derive(Clone, Debug, Default)]
pub struct CspNonce(pub String);

impl CspNonce {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }

    /// Source expression for the CSP header, e.g. `'nonce-abc=='`.
    #[must_use]
    pub fn source(&self) -> Option<String> {
        (!self.0.is_empty()).then(|| format!("'nonce-{}'", self.0))
    }
}

/// Store a fresh nonce in the request extensions.
///
/// Must run before `security_headers_middleware` so the header can use it.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!("CSP nonce missing from request extensions");
            Self::default()
        }))
    }
}
