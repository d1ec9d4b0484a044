//! In-memory cache for the generated merchant feed.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;

use super::GeneratedFeed;

/// How long a generated feed is served before it is rebuilt.
pub const FEED_TTL: Duration = Duration::from_secs(15 * 60);

/// A rendered feed and when it was built.
#[derive(Debug)]
pub struct CachedFeed {
    pub xml: String,
    pub item_count: usize,
    pub generated_at: Instant,
}

/// Freshness of the cached feed, as reported by the stats endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheState {
    pub valid: bool,
    /// Seconds since the feed was built.
    pub age_secs: Option<u64>,
    /// Seconds until the feed expires.
    pub expires_in_secs: Option<u64>,
}

/// Single-entry cache holding the last generated feed.
#[derive(Clone)]
pub struct FeedCache {
    inner: Cache<(), Arc<CachedFeed>>,
    ttl: Duration,
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(FEED_TTL)
    }

    /// Cache with a custom time-to-live.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            ttl,
        }
    }

    /// The cached feed, if it is still fresh.
    pub async fn get(&self) -> Option<Arc<CachedFeed>> {
        self.inner.get(&()).await
    }

    /// The cached feed, or the output of `generate` when it is missing or
    /// stale. Concurrent callers on a cold cache share one generation; the
    /// flag is `true` when this call's value was already cached.
    pub async fn get_or_generate<F, Fut>(&self, generate: F) -> (Arc<CachedFeed>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = GeneratedFeed>,
    {
        let entry = self
            .inner
            .entry(())
            .or_insert_with(async move {
                let generated = generate().await;
                Arc::new(CachedFeed {
                    xml: generated.xml,
                    item_count: generated.item_count,
                    generated_at: Instant::now(),
                })
            })
            .await;
        let hit = !entry.is_fresh();
        (entry.into_value(), hit)
    }

    /// Drop the cached feed so the next request rebuilds it.
    pub async fn clear(&self) {
        self.inner.invalidate(&()).await;
    }

    /// Current cache freshness.
    pub async fn state(&self) -> CacheState {
        match self.get().await {
            Some(feed) => {
                let age = feed.generated_at.elapsed();
                CacheState {
                    valid: true,
                    age_secs: Some(age.as_secs()),
                    expires_in_secs: Some(self.ttl.saturating_sub(age).as_secs()),
                }
            }
            None => CacheState {
                valid: false,
                age_secs: None,
                expires_in_secs: None,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn feed(xml: &str, item_count: usize) -> GeneratedFeed {
        GeneratedFeed {
            xml: xml.to_string(),
            item_count,
        }
    }

    #[tokio::test]
    async fn test_generate_then_hit_and_clear() {
        let cache = FeedCache::new();
        assert!(cache.get().await.is_none());
        assert!(!cache.state().await.valid);

        let (first, hit) = cache.get_or_generate(|| async { feed("<rss/>", 3) }).await;
        assert!(!hit);
        assert_eq!(first.xml, "<rss/>");
        assert_eq!(first.item_count, 3);

        let (second, hit) = cache.get_or_generate(|| async { feed("<rss>new</rss>", 9) }).await;
        assert!(hit);
        assert_eq!(second.xml, "<rss/>");
        assert!(Arc::ptr_eq(&first, &second));

        let state = cache.state().await;
        assert!(state.valid);
        assert_eq!(state.age_secs, Some(0));
        assert!(state.expires_in_secs.unwrap() <= FEED_TTL.as_secs());

        cache.clear().await;
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_misses_generate_once() {
        let cache = FeedCache::new();
        let generations = Arc::new(AtomicUsize::new(0));

        let requests = (0..8).map(|_| {
            let cache = cache.clone();
            let generations = Arc::clone(&generations);
            tokio::spawn(async move {
                cache
                    .get_or_generate(|| async move {
                        generations.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        feed("<rss/>", 1)
                    })
                    .await
            })
        });
        let results = futures::future::join_all(requests).await;

        assert_eq!(generations.load(Ordering::SeqCst), 1);
        let misses = results
            .into_iter()
            .map(|r| r.unwrap())
            .filter(|(_, hit)| !hit)
            .count();
        assert_eq!(misses, 1);
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let cache = FeedCache::with_ttl(Duration::from_millis(20));
        cache.get_or_generate(|| async { feed("<rss/>", 1) }).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.get().await.is_none());
    }
}
