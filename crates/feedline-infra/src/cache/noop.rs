use std::time::Duration;

use async_trait::async_trait;

use feedline_core::ports::{Cache, CacheError};

/// Cache that stores nothing. Every read misses, every write succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_never_hits() {
        let cache = NoopCache;
        cache.set("feed:global", "body", None).await.unwrap();
        assert_eq!(cache.get("feed:global").await.unwrap(), None);
        cache.delete("feed:global").await.unwrap();
    }
}
