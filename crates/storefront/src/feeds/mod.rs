//! Machine-readable feeds: the Google Merchant product feed and XML sitemaps.

mod cache;
pub mod merchant;
pub mod sitemap;
mod xml;

pub use cache::{CacheState, CachedFeed, FEED_TTL, FeedCache};
pub use merchant::{FeedStats, GeneratedFeed, generate_feed};
