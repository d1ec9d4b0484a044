//! Domain models for the storefront.
//!
//! These mirror the Supabase tables one to one; row types and SQL live in
//! `crate::db`.

pub mod activity;
pub mod cart;
pub mod order;
pub mod profile;
pub mod session;

pub use activity::{SearchHistoryEntry, ViewedProduct, WishlistItem};
pub use cart::{Cart, CartItem, CartTotals, CartWithItems, Customization, LinePrices, NewCartItem};
pub use order::{Order, OrderDetails, OrderItem, OrderSummary};
pub use profile::{OnboardingAnswers, OnboardingStatus, UserProfile};
pub use session::CurrentUser;
