//! In-process cache store with per-key TTL.
//!
//! Only coherent within a single process; multi-instance deployments use the
//! Redis backend.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::cache::{CacheBatch, CacheCommand, CacheError, CacheStore, CacheValue, check_ttl};
use crate::config::settings::MemoryCacheConfig;

#[derive(Debug, Clone, Default)]
struct HashEntry {
    fields: HashMap<String, CacheValue>,
    expires_at: Option<Instant>,
}

impl HashEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

type Entries = HashMap<String, HashEntry>;

/// In-memory hash store bounded by a maximum number of keys.
pub struct MemoryCacheStore {
    entries: Mutex<Entries>,
    max_keys: usize,
}

impl MemoryCacheStore {
    pub fn new(config: &MemoryCacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_keys: config.max_keys.max(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>, CacheError> {
        self.entries
            .lock()
            .map_err(|e| CacheError::Operation(e.to_string()))
    }

    /// Remaining lifetime of a key, `None` when absent or without TTL.
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let now = Instant::now();
        let entries = self.lock()?;
        Ok(live_entry(&entries, key, now)
            .and_then(|entry| entry.expires_at)
            .map(|deadline| deadline.saturating_duration_since(now)))
    }

    fn apply(&self, entries: &mut Entries, command: CacheCommand, now: Instant) -> Result<(), CacheError> {
        match command {
            CacheCommand::Del { key } => {
                entries.remove(&key);
            }
            CacheCommand::HSet { key, fields } => {
                if fields.is_empty() {
                    return Err(CacheError::Operation(
                        "HSET requires at least one field".to_string(),
                    ));
                }
                if live_entry(entries, &key, now).is_none() {
                    entries.remove(&key);
                    self.make_room(entries, now)?;
                }
                entries.entry(key).or_default().fields.extend(fields);
            }
            CacheCommand::Expire { key, ttl_seconds } => {
                if let Some(entry) = entries.get_mut(&key).filter(|entry| entry.is_live(now)) {
                    entry.expires_at = Some(expiry_at(now, ttl_seconds)?);
                }
            }
        }
        Ok(())
    }

    /// Drop expired keys, then the key closest to expiry if still full.
    /// Keys without a TTL go last.
    fn make_room(&self, entries: &mut Entries, now: Instant) -> Result<(), CacheError> {
        entries.retain(|_, entry| entry.is_live(now));
        if entries.len() < self.max_keys {
            return Ok(());
        }

        let victim = entries
            .iter()
            .min_by_key(|(_, entry)| (entry.expires_at.is_none(), entry.expires_at))
            .map(|(key, _)| key.clone());
        match victim {
            Some(key) => {
                tracing::debug!(evicted = %key, "memory cache full, evicting key");
                entries.remove(&key);
                Ok(())
            }
            None => Err(CacheError::Operation("memory cache has no capacity".to_string())),
        }
    }
}

fn expiry_at(now: Instant, ttl_seconds: u64) -> Result<Instant, CacheError> {
    now.checked_add(Duration::from_secs(check_ttl(ttl_seconds)?))
        .ok_or_else(|| CacheError::Operation(format!("TTL of {ttl_seconds}s overflows the clock")))
}

fn live_entry<'a>(entries: &'a Entries, key: &str, now: Instant) -> Option<&'a HashEntry> {
    entries.get(key).filter(|entry| entry.is_live(now))
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<CacheValue>, CacheError> {
        let entries = self.lock()?;
        Ok(live_entry(&entries, key, Instant::now())
            .and_then(|entry| entry.fields.get(field))
            .cloned())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, CacheValue>, CacheError> {
        let entries = self.lock()?;
        Ok(live_entry(&entries, key, Instant::now())
            .map(|entry| entry.fields.clone())
            .unwrap_or_default())
    }

    async fn hset(&self, key: &str, fields: &[(String, CacheValue)]) -> Result<(), CacheError> {
        let mut entries = self.lock()?;
        let command = CacheCommand::HSet {
            key: key.to_string(),
            fields: fields.to_vec(),
        };
        self.apply(&mut entries, command, Instant::now())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let entries = self.lock()?;
        Ok(live_entry(&entries, key, Instant::now()).is_some())
    }

    async fn del(&self, key: &str) -> Result<bool, CacheError> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        Ok(entries.remove(key).is_some_and(|entry| entry.is_live(now)))
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool, CacheError> {
        let now = Instant::now();
        let expires_at = expiry_at(now, ttl_seconds)?;
        let mut entries = self.lock()?;
        match entries.get_mut(key).filter(|entry| entry.is_live(now)) {
            Some(entry) => {
                entry.expires_at = Some(expires_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn hset_existing(
        &self,
        key: &str,
        field: &str,
        value: CacheValue,
        ttl_seconds: u64,
    ) -> Result<bool, CacheError> {
        let now = Instant::now();
        let expires_at = expiry_at(now, ttl_seconds)?;
        let mut entries = self.lock()?;
        match entries.get_mut(key).filter(|entry| entry.is_live(now)) {
            Some(entry) => {
                entry.fields.insert(field.to_string(), value);
                entry.expires_at = Some(expires_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn execute(&self, batch: CacheBatch) -> Result<(), CacheError> {
        let mut entries = self.lock()?;
        let now = Instant::now();

        // Stage on a copy so a failing command leaves the live map untouched.
        let mut staged = entries.clone();
        for command in batch.into_commands() {
            self.apply(&mut staged, command, now)?;
        }
        *entries = staged;
        Ok(())
    }
}
