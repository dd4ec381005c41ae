//! Deadline enforcement for durable store calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::models::SettingRecord;
use crate::repositories::SettingsStore;

/// Wraps a [`SettingsStore`] and fails any call that outlives `timeout`
/// with `AppError::Timeout`.
#[derive(Clone)]
pub struct TimeBoundStore {
    inner: Arc<dyn SettingsStore>,
    timeout: Duration,
}

impl TimeBoundStore {
    pub fn new(inner: Arc<dyn SettingsStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = AppResult<T>> + Send,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout {
                operation: operation.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

#[async_trait]
impl SettingsStore for TimeBoundStore {
    async fn list_all(&self) -> AppResult<Vec<SettingRecord>> {
        self.bounded("list settings", self.inner.list_all()).await
    }

    async fn find(&self, key: &str) -> AppResult<Option<SettingRecord>> {
        self.bounded("find setting", self.inner.find(key)).await
    }

    async fn insert(&self, record: SettingRecord) -> AppResult<SettingRecord> {
        self.bounded("insert setting", self.inner.insert(record)).await
    }

    async fn update(&self, key: &str, value: bool) -> AppResult<SettingRecord> {
        self.bounded("update setting", self.inner.update(key, value))
            .await
    }

    async fn toggle(&self, key: &str) -> AppResult<SettingRecord> {
        self.bounded("toggle setting", self.inner.toggle(key)).await
    }

    async fn upsert(&self, key: &str, value: bool) -> AppResult<SettingRecord> {
        self.bounded("upsert setting", self.inner.upsert(key, value))
            .await
    }

    async fn rename(&self, old_key: &str, new_key: &str) -> AppResult<SettingRecord> {
        self.bounded("rename setting", self.inner.rename(old_key, new_key))
            .await
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        self.bounded("delete setting", self.inner.delete(key)).await
    }
}
