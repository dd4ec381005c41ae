//! Builds the configured cache backend.

use std::sync::Arc;

use crate::cache::memory::MemoryCacheStore;
use crate::cache::redis::RedisCacheStore;
use crate::cache::{CacheError, CacheStore};
use crate::config::settings::{CacheBackend, CacheConfig};

/// Create the cache store selected by `cache.backend`.
///
/// The returned handle is owned by the bootstrap and injected into the
/// engine; there is no process-wide instance.
pub async fn build_cache_store(config: &CacheConfig) -> Result<Arc<dyn CacheStore>, CacheError> {
    let store: Arc<dyn CacheStore> = match config.backend {
        CacheBackend::Memory => Arc::new(MemoryCacheStore::new(&config.memory)),
        CacheBackend::Redis => Arc::new(RedisCacheStore::new(&config.redis).await?),
    };

    tracing::info!(backend = ?config.backend, "cache store ready");
    Ok(store)
}
