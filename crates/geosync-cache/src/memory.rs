//! In-memory cache implementation using the moka crate.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use geosync_core::config::cache::CacheConfig;
use geosync_core::result::AppResult;
use geosync_core::traits::cache::CacheProvider;

/// In-memory cache provider using moka.
///
/// TTL is enforced at the cache level from configuration; the per-call
/// `ttl` argument is accepted for contract compatibility but entries
/// expire after the configured `time_to_live_seconds`. Callers that need
/// a distinct TTL get their own provider instance.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    cache: Cache<String, String>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.time_to_live_seconds))
            .build();
        Self { cache }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, value: &str, _ttl: Duration) -> AppResult<()> {
        self.cache.insert(key.to_string(), value.to_string()).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.cache.contains_key(key))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn flush_all(&self) -> AppResult<()> {
        self.cache.invalidate_all();
        debug!("Cache flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_provider(ttl_seconds: u64) -> MemoryCacheProvider {
        MemoryCacheProvider::new(&CacheConfig {
            max_capacity: 1000,
            time_to_live_seconds: ttl_seconds,
        })
    }

    #[tokio::test]
    async fn test_set_get() {
        let provider = make_provider(60);
        provider
            .set("snapshot", "{\"queue\":\"ok\"}", Duration::from_secs(60))
            .await
            .unwrap();
        let val = provider.get("snapshot").await.unwrap();
        assert_eq!(val, Some("{\"queue\":\"ok\"}".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let provider = make_provider(60);
        provider
            .set("snapshot", "x", Duration::from_secs(60))
            .await
            .unwrap();
        provider.delete("snapshot").await.unwrap();
        assert_eq!(provider.get("snapshot").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let provider = make_provider(1);
        provider
            .set("snapshot", "x", Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(provider.get("snapshot").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flush_all() {
        let provider = make_provider(60);
        provider.set("a", "1", Duration::from_secs(60)).await.unwrap();
        provider.set("b", "2", Duration::from_secs(60)).await.unwrap();
        provider.flush_all().await.unwrap();
        assert_eq!(provider.get("a").await.unwrap(), None);
        assert_eq!(provider.get("b").await.unwrap(), None);
    }
}
