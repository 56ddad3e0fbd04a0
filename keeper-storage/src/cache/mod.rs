mod memory_store;
mod noop_store;

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use memory_store::MemoryCacheStore;
use noop_store::NoopCacheStore;

#[derive(Clone, Debug)]
enum CacheBackend {
    Disabled(NoopCacheStore),
    Memory(MemoryCacheStore),
}

/// Process-wide document cache. Values are stored serialized so a reader
/// always gets its own copy and can never mutate the cached document in place.
#[derive(Clone, Debug)]
pub struct CacheService {
    key_prefix: String,
    backend: CacheBackend,
}

impl CacheService {
    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Disabled(NoopCacheStore),
        }
    }

    pub fn memory(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Memory(MemoryCacheStore::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.backend, CacheBackend::Memory(_))
    }

    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        format!("{}:{}", self.key_prefix, suffix.as_ref())
    }

    pub async fn get_json<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let value = match &self.backend {
            CacheBackend::Disabled(store) => store.get(key).await,
            CacheBackend::Memory(store) => store.get(key).await,
        }?;

        match value {
            Some(bytes) => {
                let parsed = serde_json::from_slice(&bytes).map_err(|e| {
                    anyhow::anyhow!("failed to deserialize cache value for `{key}`: {e}")
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn set_json<T>(&self, key: &str, value: &T) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let payload = serde_json::to_vec(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize cache value for `{key}`: {e}"))?;

        match &self.backend {
            CacheBackend::Disabled(store) => store.set(key, payload).await,
            CacheBackend::Memory(store) => store.set(key, payload).await,
        }
    }

    pub async fn del(&self, key: &str) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled(store) => store.del(key).await,
            CacheBackend::Memory(store) => store.del(key).await,
        }
    }

    /// Evict every key that starts with `prefix`. Returns the number of evicted entries.
    pub async fn del_prefix(&self, prefix: &str) -> anyhow::Result<usize> {
        match &self.backend {
            CacheBackend::Disabled(store) => store.del_prefix(prefix).await,
            CacheBackend::Memory(store) => store.del_prefix(prefix).await,
        }
    }

    pub async fn get_or_load_json<T, F, Fut>(&self, key: &str, loader: F) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match self.get_json::<T>(key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(?e, cache_key = key, "cache get failed; falling back to storage"),
        }

        let loaded = loader().await?;

        if let Err(e) = self.set_json(key, &loaded).await {
            warn!(?e, cache_key = key, "cache set failed; returning stored value");
        }

        Ok(loaded)
    }
}

pub fn guild_config_prefix(cache: &CacheService) -> String {
    cache.key("guild_config:")
}

pub fn guild_config_key(cache: &CacheService, guild_id: u64) -> String {
    cache.key(format!("guild_config:{guild_id}"))
}

pub async fn invalidate_guild_config(cache: &CacheService, guild_id: u64) -> anyhow::Result<()> {
    cache.del(&guild_config_key(cache, guild_id)).await
}

pub async fn invalidate_all_guild_configs(cache: &CacheService) -> anyhow::Result<usize> {
    cache.del_prefix(&guild_config_prefix(cache)).await
}

#[cfg(test)]
mod tests {
    use super::{CacheService, guild_config_key, invalidate_all_guild_configs};

    #[tokio::test]
    async fn memory_cache_returns_independent_copies() {
        let cache = CacheService::memory("test");
        cache.set_json("test:a", &vec![1_u64, 2, 3]).await.unwrap();

        let mut first: Vec<u64> = cache.get_json("test:a").await.unwrap().unwrap();
        first.push(4);

        let second: Vec<u64> = cache.get_json("test:a").await.unwrap().unwrap();
        assert_eq!(second, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn disabled_cache_never_hits() {
        let cache = CacheService::disabled("test");
        cache.set_json("test:a", &1_u64).await.unwrap();
        assert_eq!(cache.get_json::<u64>("test:a").await.unwrap(), None);
        assert!(!cache.is_enabled());
    }

    #[tokio::test]
    async fn prefix_eviction_only_touches_guild_configs() {
        let cache = CacheService::memory("keeper");
        cache.set_json(&guild_config_key(&cache, 1), &"one").await.unwrap();
        cache.set_json(&guild_config_key(&cache, 2), &"two").await.unwrap();
        cache.set_json("keeper:other", &"kept").await.unwrap();

        let evicted = invalidate_all_guild_configs(&cache).await.unwrap();
        assert_eq!(evicted, 2);
        assert_eq!(
            cache.get_json::<String>("keeper:other").await.unwrap().as_deref(),
            Some("kept")
        );
        assert_eq!(
            cache
                .get_json::<String>(&guild_config_key(&cache, 1))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn get_or_load_only_calls_loader_on_miss() {
        let cache = CacheService::memory("test");
        let first: u64 = cache
            .get_or_load_json("test:n", || async { Ok(7) })
            .await
            .unwrap();
        let second: u64 = cache
            .get_or_load_json("test:n", || async { anyhow::bail!("loader should not run") })
            .await
            .unwrap();
        assert_eq!((first, second), (7, 7));
    }
}
