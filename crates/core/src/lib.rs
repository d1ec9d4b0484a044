//! IMPACTO33 Core - Shared domain types.
//!
//! Types used by every IMPACTO33 component:
//! - `storefront` - Public-facing catalog, cart and account site
//! - `cli` - Command-line tools for migrations and sitemap generation
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Database encoding is opt-in via the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, money/VAT helpers and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
