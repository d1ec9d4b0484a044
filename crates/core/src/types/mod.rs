//! Core types for IMPACTO33.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price, VAT_RATE, add_vat, remove_vat, round_cents};
pub use status::*;
