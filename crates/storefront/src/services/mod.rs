//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Supabase Auth (sign-up, sign-in, token refresh, password reset)
//! - `email` - SMTP delivery of quote emails
//! - `quote` - Validation of quote requests from product pages

pub mod auth;
pub mod email;
pub mod quote;
