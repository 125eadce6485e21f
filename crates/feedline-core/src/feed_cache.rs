//! Whole-page cache for the global feed.
//!
//! Renders are stored per served page under a generation, as
//! `feed:global:{generation}:{page}`. Invalidation moves `feed:global:gen` to a
//! fresh value, so a render computed before a mutation can only land in a
//! generation that readers no longer consult.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::pagination::clamp_page_number;
use crate::ports::{Cache, CacheError};

const GENERATION_KEY: &str = "feed:global:gen";

fn page_key(generation: &str, page: usize) -> String {
    format!("feed:global:{}:{}", generation, page)
}

fn page_count_key(generation: &str) -> String {
    format!("feed:global:{}:pages", generation)
}

fn new_generation() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Generation a lookup was made under. A render for that miss is stored
/// back into it, never into whatever generation is current by then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation(Option<String>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(String),
    Miss(Generation),
}

/// Global-feed cache service over an injectable [`Cache`] backend.
#[derive(Clone)]
pub struct GlobalFeedCache {
    cache: Arc<dyn Cache>,
    ttl: Option<Duration>,
}

impl GlobalFeedCache {
    /// `ttl` of `None` keeps renders until the next invalidation.
    pub fn new(cache: Arc<dyn Cache>, ttl: Option<Duration>) -> Self {
        Self { cache, ttl }
    }

    /// Cached render for the page a request for `requested` would be served.
    ///
    /// Must run before the feed is read from the store. Backend failures
    /// count as a miss.
    pub async fn lookup(&self, requested: Option<i64>) -> Lookup {
        let Some(generation) = self.current_generation().await else {
            return Lookup::Miss(Generation(None));
        };

        let num_pages = self
            .read(&page_count_key(&generation))
            .await
            .and_then(|raw| raw.parse::<usize>().ok());
        let render = match num_pages {
            Some(num_pages) => {
                let page = clamp_page_number(requested, num_pages);
                self.read(&page_key(&generation, page)).await
            }
            None => None,
        };

        match render {
            Some(render) => Lookup::Hit(render),
            None => Lookup::Miss(Generation(Some(generation))),
        }
    }

    /// Store the render of served page `page` out of `num_pages`.
    /// Failures are logged, never propagated.
    pub async fn put(&self, generation: &Generation, page: usize, num_pages: usize, render: &str) {
        let Some(generation) = generation.0.as_deref() else {
            return;
        };

        let stored = match self
            .cache
            .set(&page_key(generation, page), render, self.ttl)
            .await
        {
            Ok(()) => {
                self.cache
                    .set(&page_count_key(generation), &num_pages.to_string(), self.ttl)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = stored {
            tracing::warn!(page, error = %e, "Failed to store global feed render");
        }
    }

    /// Retire every cached page of the global feed.
    pub async fn invalidate(&self) -> Result<(), CacheError> {
        let previous = self.cache.get(GENERATION_KEY).await?;
        self.cache
            .set(GENERATION_KEY, &new_generation(), None)
            .await?;
        tracing::debug!(backend = self.cache.backend(), "Global feed cache invalidated");

        if let Some(previous) = previous {
            self.sweep(&previous).await;
        }
        Ok(())
    }

    async fn current_generation(&self) -> Option<String> {
        match self.cache.get(GENERATION_KEY).await {
            Ok(Some(generation)) => Some(generation),
            Ok(None) => {
                let generation = new_generation();
                match self.cache.set(GENERATION_KEY, &generation, None).await {
                    Ok(()) => Some(generation),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to start a global feed cache generation");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Global feed cache read failed, treating as miss");
                None
            }
        }
    }

    /// Best-effort removal of a retired generation's pages.
    async fn sweep(&self, generation: &str) {
        let count_key = page_count_key(generation);
        let Some(num_pages) = self
            .read(&count_key)
            .await
            .and_then(|raw| raw.parse::<usize>().ok())
        else {
            return;
        };

        for page in 1..=num_pages {
            if let Err(e) = self.cache.delete(&page_key(generation, page)).await {
                tracing::warn!(page, error = %e, "Failed to sweep retired global feed page");
                return;
            }
        }
        if let Err(e) = self.cache.delete(&count_key).await {
            tracing::warn!(error = %e, "Failed to sweep retired global feed page count");
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Global feed cache read failed, treating as miss");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    #[derive(Default)]
    struct MapCache {
        entries: Mutex<HashMap<String, (String, Option<Duration>)>>,
    }

    impl MapCache {
        fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }
    }

    #[async_trait]
    impl Cache for MapCache {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .get(key)
                .map(|(value, _)| value.clone()))
        }

        async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), ttl));
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        fn backend(&self) -> &'static str {
            "map"
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl Cache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Connection("down".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<(), CacheError> {
            Err(CacheError::Connection("down".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Connection("down".to_string()))
        }

        fn backend(&self) -> &'static str {
            "broken"
        }
    }

    async fn miss(cache: &GlobalFeedCache, requested: Option<i64>) -> Generation {
        match cache.lookup(requested).await {
            Lookup::Miss(generation) => generation,
            Lookup::Hit(render) => panic!("unexpected hit: {}", render),
        }
    }

    #[tokio::test]
    async fn test_pages_are_cached_separately() {
        let cache = GlobalFeedCache::new(Arc::new(MapCache::default()), None);
        let generation = miss(&cache, Some(1)).await;
        cache.put(&generation, 1, 3, "page one").await;
        cache.put(&generation, 2, 3, "page two").await;

        assert_eq!(cache.lookup(Some(1)).await, Lookup::Hit("page one".to_string()));
        assert_eq!(cache.lookup(Some(2)).await, Lookup::Hit("page two".to_string()));
        assert!(matches!(cache.lookup(Some(3)).await, Lookup::Miss(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_requests_share_the_served_page() {
        let backend = Arc::new(MapCache::default());
        let cache = GlobalFeedCache::new(backend.clone(), None);
        let generation = miss(&cache, Some(99)).await;
        cache.put(&generation, 1, 1, "only page").await;
        let keys = backend.keys();

        for requested in [Some(1), Some(99), Some(2000), Some(-3), None] {
            assert_eq!(
                cache.lookup(requested).await,
                Lookup::Hit("only page".to_string()),
                "requested {:?}",
                requested
            );
        }
        assert_eq!(backend.keys(), keys);
    }

    #[tokio::test]
    async fn test_render_from_before_invalidation_is_never_served() {
        let cache = GlobalFeedCache::new(Arc::new(MapCache::default()), None);
        let generation = miss(&cache, Some(1)).await;

        cache.invalidate().await.unwrap();
        cache
            .put(&generation, 1, 1, "page one before the post mutation")
            .await;

        assert!(matches!(cache.lookup(Some(1)).await, Lookup::Miss(_)));
    }

    #[tokio::test]
    async fn test_invalidate_drops_every_page() {
        let backend = Arc::new(MapCache::default());
        let cache = GlobalFeedCache::new(backend.clone(), None);
        let generation = miss(&cache, None).await;
        cache.put(&generation, 1, 2, "page one").await;
        cache.put(&generation, 2, 2, "page two").await;

        cache.invalidate().await.unwrap();

        assert!(matches!(cache.lookup(Some(1)).await, Lookup::Miss(_)));
        assert!(matches!(cache.lookup(Some(2)).await, Lookup::Miss(_)));
        assert_eq!(backend.keys(), [GENERATION_KEY]);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let cache = GlobalFeedCache::new(Arc::new(MapCache::default()), None);
        cache.invalidate().await.unwrap();
        cache.invalidate().await.unwrap();
        assert!(matches!(cache.lookup(None).await, Lookup::Miss(Generation(Some(_)))));
    }

    #[tokio::test]
    async fn test_pages_carry_the_configured_ttl() {
        let backend = Arc::new(MapCache::default());
        let ttl = Duration::from_secs(20);
        let cache = GlobalFeedCache::new(backend.clone(), Some(ttl));
        let generation = miss(&cache, None).await;
        cache.put(&generation, 1, 1, "page one").await;

        let entries = backend.entries.lock().unwrap();
        for (key, (_, key_ttl)) in entries.iter() {
            let expected = if key == GENERATION_KEY { None } else { Some(ttl) };
            assert_eq!(*key_ttl, expected, "key {}", key);
        }
    }

    #[tokio::test]
    async fn test_backend_failures_are_misses_but_invalidation_fails() {
        let cache = GlobalFeedCache::new(Arc::new(BrokenCache), None);
        let generation = miss(&cache, Some(1)).await;
        assert_eq!(generation, Generation(None));
        cache.put(&generation, 1, 1, "ignored").await;
        assert!(matches!(cache.lookup(Some(1)).await, Lookup::Miss(_)));
        assert!(cache.invalidate().await.is_err());
    }
}
