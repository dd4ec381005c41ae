//! In-crate test doubles for the store, cache and audit seams.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{CacheBatch, CacheError, CacheStore, CacheValue};
use crate::error::{AppError, AppResult};
use crate::models::SettingRecord;
use crate::repositories::SettingsStore;
use crate::services::{AuditEvent, AuditSink};

/// `SettingsStore` over a `BTreeMap`, with a `list_all` counter and fault
/// switches.
#[derive(Default)]
pub struct MemorySettingsStore {
    rows: Mutex<BTreeMap<String, bool>>,
    list_calls: AtomicUsize,
    list_delay: Mutex<Duration>,
    failing: AtomicBool,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows<'a>(rows: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        let store = Self::new();
        store.rows.lock().unwrap().extend(
            rows.into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        );
        store
    }

    /// Number of `list_all` calls so far, i.e. reloads that reached the store.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Make `list_all` sleep after it has read the rows.
    pub fn set_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = delay;
    }

    /// Make every call fail with `AppError::Database`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn value(&self, key: &str) -> Option<bool> {
        self.rows.lock().unwrap().get(key).copied()
    }

    /// Change a row behind the engine's back.
    pub fn put(&self, key: &str, value: bool) {
        self.rows.lock().unwrap().insert(key.to_string(), value);
    }

    fn check(&self, operation: &str) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Database {
                operation: operation.to_string(),
                source: anyhow::anyhow!("store offline"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn list_all(&self) -> AppResult<Vec<SettingRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check("list settings")?;

        let rows: Vec<SettingRecord> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|(key, value)| SettingRecord::new(key.clone(), *value))
            .collect();

        let delay = *self.list_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(rows)
    }

    async fn find(&self, key: &str) -> AppResult<Option<SettingRecord>> {
        self.check("find setting")?;
        let found = self.value(key).map(|value| SettingRecord::new(key, value));
        // Suspend after reading so concurrent callers interleave between reads and writes.
        tokio::task::yield_now().await;
        Ok(found)
    }

    async fn insert(&self, record: SettingRecord) -> AppResult<SettingRecord> {
        self.check("insert setting")?;
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&record.key) {
            return Err(AppError::setting_conflict(&record.key));
        }
        rows.insert(record.key.clone(), record.value);
        Ok(record)
    }

    async fn update(&self, key: &str, value: bool) -> AppResult<SettingRecord> {
        self.check("update setting")?;
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(key) {
            Some(stored) => {
                *stored = value;
                Ok(SettingRecord::new(key, value))
            }
            None => Err(AppError::setting_not_found(key)),
        }
    }

    async fn toggle(&self, key: &str) -> AppResult<SettingRecord> {
        self.check("toggle setting")?;
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(key) {
            Some(stored) => {
                *stored = !*stored;
                Ok(SettingRecord::new(key, *stored))
            }
            None => Err(AppError::setting_not_found(key)),
        }
    }

    async fn upsert(&self, key: &str, value: bool) -> AppResult<SettingRecord> {
        self.check("upsert setting")?;
        self.put(key, value);
        Ok(SettingRecord::new(key, value))
    }

    async fn rename(&self, old_key: &str, new_key: &str) -> AppResult<SettingRecord> {
        self.check("rename setting")?;
        let mut rows = self.rows.lock().unwrap();
        if !rows.contains_key(old_key) {
            return Err(AppError::setting_not_found(old_key));
        }
        if rows.contains_key(new_key) {
            return Err(AppError::setting_conflict(new_key));
        }
        let value = rows.remove(old_key).unwrap_or_default();
        rows.insert(new_key.to_string(), value);
        Ok(SettingRecord::new(new_key, value))
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        self.check("delete setting")?;
        Ok(self.rows.lock().unwrap().remove(key).is_some())
    }
}

/// Cache wrapper whose reads, batches or every call can be made to fail or
/// stall.
pub struct FlakyCache {
    inner: Arc<dyn CacheStore>,
    fail_reads: AtomicBool,
    fail_batches: AtomicBool,
    down: AtomicBool,
    delay: Mutex<Duration>,
}

impl FlakyCache {
    pub fn new(inner: Arc<dyn CacheStore>) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_batches: AtomicBool::new(false),
            down: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Make every call sleep before reaching the inner store.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    async fn stall(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_batches(&self, fail: bool) {
        self.fail_batches.store(fail, Ordering::SeqCst);
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check_down(&self) -> Result<(), CacheError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("connection refused".to_string()));
        }
        Ok(())
    }

    fn check(&self, switch: &AtomicBool) -> Result<(), CacheError> {
        self.check_down()?;
        if switch.load(Ordering::SeqCst) {
            return Err(CacheError::Operation("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FlakyCache {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<CacheValue>, CacheError> {
        self.stall().await;
        self.check(&self.fail_reads)?;
        self.inner.hget(key, field).await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, CacheValue>, CacheError> {
        self.stall().await;
        self.check(&self.fail_reads)?;
        self.inner.hgetall(key).await
    }

    async fn hset(&self, key: &str, fields: &[(String, CacheValue)]) -> Result<(), CacheError> {
        self.stall().await;
        self.check_down()?;
        self.inner.hset(key, fields).await
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.stall().await;
        self.check(&self.fail_reads)?;
        self.inner.exists(key).await
    }

    async fn del(&self, key: &str) -> Result<bool, CacheError> {
        self.stall().await;
        self.check_down()?;
        self.inner.del(key).await
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool, CacheError> {
        self.stall().await;
        self.check_down()?;
        self.inner.expire(key, ttl_seconds).await
    }

    async fn hset_existing(
        &self,
        key: &str,
        field: &str,
        value: CacheValue,
        ttl_seconds: u64,
    ) -> Result<bool, CacheError> {
        self.stall().await;
        self.check_down()?;
        self.inner
            .hset_existing(key, field, value, ttl_seconds)
            .await
    }

    async fn execute(&self, batch: CacheBatch) -> Result<(), CacheError> {
        self.stall().await;
        self.check(&self.fail_batches)?;
        self.inner.execute(batch).await
    }
}

/// Keeps every recorded event; can be switched to fail.
#[derive(Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
    failing: AtomicBool,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, event: AuditEvent) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal {
                source: anyhow::anyhow!("audit log unavailable"),
            });
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
