use std::time::Duration;

use async_trait::async_trait;

use super::FlagCache;

/// Cache backend that stores nothing, so every rule load goes to the remote
/// source.
#[derive(Debug, Default)]
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        NullCache
    }
}

#[async_trait]
impl FlagCache for NullCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) {}

    async fn contains(&self, _key: &str) -> bool {
        false
    }

    async fn remove(&self, _key: &str) {}

    async fn clear(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_cache_discards_writes() {
        let cache = NullCache::new();
        cache.set("key1", "value1", None).await;
        assert_eq!(cache.get("key1").await, None);
        assert!(!cache.contains("key1").await);
        cache.remove("key1").await;
        cache.clear().await;
    }
}
