//! Read-through snapshot of the settings table.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;

use crate::cache::{CacheBatch, CacheStore, CacheValue, SettingsCacheKey, decode_flag};
use crate::engine::ReloadError;
use crate::engine::single_flight::SingleFlight;
use crate::error::AppResult;
use crate::models::normalize_key;
use crate::repositories::SettingsStore;

/// Keeps the cached settings snapshot coherent with the durable store.
///
/// Reads go to the snapshot hash and rebuild it on demand; at most one
/// rebuild runs at a time per engine. Reads never fail: when the cache or
/// the rebuild is unavailable they fall back to the durable store.
pub struct SettingsCacheEngine {
    store: Arc<dyn SettingsStore>,
    cache: Arc<dyn CacheStore>,
    key: SettingsCacheKey,
    ttl_seconds: u64,
    reloads: SingleFlight,
}

impl SettingsCacheEngine {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        cache: Arc<dyn CacheStore>,
        key: SettingsCacheKey,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            store,
            cache,
            key,
            ttl_seconds,
            reloads: SingleFlight::new(),
        }
    }

    pub fn cache_key(&self) -> &SettingsCacheKey {
        &self.key
    }

    /// Replace the snapshot with every row of the durable store.
    ///
    /// Joins the reload already in flight when there is one. Returns the
    /// number of rows loaded.
    ///
    /// An empty table leaves no snapshot behind, so while the table stays
    /// empty every read reloads and costs one `list_all` query.
    pub async fn reload_all(&self) -> Result<usize, ReloadError> {
        let store = Arc::clone(&self.store);
        let cache = Arc::clone(&self.cache);
        let key = self.key.clone();
        let ttl_seconds = self.ttl_seconds;

        self.reloads
            .join_or_start(move || rebuild_snapshot(store, cache, key, ttl_seconds).boxed())
            .await
    }

    /// Whether the setting is enabled. Unknown keys are disabled.
    pub async fn get_one(&self, key: &str) -> bool {
        let field = normalize_key(key);

        match self.cached_flag(&field).await {
            Ok(enabled) => enabled,
            Err(e) => {
                tracing::warn!(
                    cache_key = %self.key,
                    field = %field,
                    error = %e,
                    "Settings cache unavailable, reading durable store"
                );
                self.durable_flag(&field).await
            }
        }
    }

    /// Every setting, keyed by normalized key.
    pub async fn get_all(&self) -> BTreeMap<String, bool> {
        match self.cached_all().await {
            Ok(all) => all,
            Err(e) => {
                tracing::warn!(
                    cache_key = %self.key,
                    error = %e,
                    "Settings cache unavailable, listing durable store"
                );
                match self.store.list_all().await {
                    Ok(rows) => rows.into_iter().map(|row| (row.key, row.value)).collect(),
                    Err(e) => {
                        tracing::error!(error = %e, "Durable settings fallback failed");
                        BTreeMap::new()
                    }
                }
            }
        }
    }

    /// Drop the snapshot and rebuild it from the durable store.
    ///
    /// Called after every mutation. A reload that was already running may
    /// have read rows from before the mutation, so it is awaited and then
    /// superseded by a fresh one.
    pub async fn invalidate(&self) -> AppResult<usize> {
        self.cache.del(self.key.as_str()).await?;

        if let Some(stale) = self.reloads.current() {
            if let Err(e) = stale.await {
                tracing::debug!(error = %e, "Superseded reload failed");
            }
        }

        Ok(self.reload_all().await?)
    }

    /// Write one field into the snapshot if it exists, refreshing the TTL.
    ///
    /// Returns `false` and writes nothing when there is no snapshot.
    pub async fn set_one(&self, key: &str, value: bool) -> AppResult<bool> {
        let field = normalize_key(key);
        let updated = self
            .cache
            .hset_existing(
                self.key.as_str(),
                &field,
                CacheValue::flag(value),
                self.ttl_seconds,
            )
            .await?;
        Ok(updated)
    }

    async fn cached_flag(&self, field: &str) -> AppResult<bool> {
        let key = self.key.as_str();

        if let Some(value) = self.cache.hget(key, field).await? {
            return Ok(decode_flag(&value));
        }
        if self.cache.exists(key).await? {
            return Ok(false);
        }

        self.reload_all().await?;
        Ok(self
            .cache
            .hget(key, field)
            .await?
            .is_some_and(|value| decode_flag(&value)))
    }

    async fn cached_all(&self) -> AppResult<BTreeMap<String, bool>> {
        let key = self.key.as_str();

        let mut fields = self.cache.hgetall(key).await?;
        if fields.is_empty() {
            // A stored hash is never empty, so this is a missing snapshot.
            self.reload_all().await?;
            fields = self.cache.hgetall(key).await?;
        }

        Ok(fields
            .iter()
            .map(|(field, value)| (field.clone(), decode_flag(value)))
            .collect())
    }

    async fn durable_flag(&self, field: &str) -> bool {
        match self.store.find(field).await {
            Ok(row) => row.is_some_and(|row| row.value),
            Err(e) => {
                tracing::error!(
                    field = %field,
                    error = %e,
                    "Durable settings fallback failed"
                );
                false
            }
        }
    }
}

async fn rebuild_snapshot(
    store: Arc<dyn SettingsStore>,
    cache: Arc<dyn CacheStore>,
    key: SettingsCacheKey,
    ttl_seconds: u64,
) -> Result<usize, ReloadError> {
    let started = Instant::now();

    let rows = store
        .list_all()
        .await
        .map_err(|e| ReloadError::Store(e.to_string()))?;

    let mut batch = CacheBatch::new().del(key.as_str());
    if !rows.is_empty() {
        let fields = rows
            .iter()
            .map(|row| (row.key.clone(), CacheValue::flag(row.value)))
            .collect();
        batch = batch
            .hset(key.as_str(), fields)
            .expire(key.as_str(), ttl_seconds);
    }

    cache
        .execute(batch)
        .await
        .map_err(|e| ReloadError::Cache(e.to_string()))?;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    if rows.is_empty() {
        tracing::debug!(cache_key = %key, elapsed_ms, "Settings table empty, snapshot cleared");
    } else {
        tracing::info!(
            cache_key = %key,
            records = rows.len(),
            elapsed_ms,
            "Settings snapshot rebuilt"
        );
    }

    Ok(rows.len())
}
