//! Deadline enforcement for cache calls.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{CacheBatch, CacheError, CacheStore, CacheValue};

/// Wraps a [`CacheStore`] and turns calls that outlive `timeout` into
/// `CacheError::Timeout`.
#[derive(Clone)]
pub struct TimeBoundCache {
    inner: Arc<dyn CacheStore>,
    timeout: Duration,
}

impl TimeBoundCache {
    pub fn new(inner: Arc<dyn CacheStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = Result<T, CacheError>> + Send,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .unwrap_or_else(|_| {
                Err(CacheError::Timeout {
                    operation: operation.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            })
    }
}

#[async_trait]
impl CacheStore for TimeBoundCache {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<CacheValue>, CacheError> {
        self.bounded("HGET", self.inner.hget(key, field)).await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, CacheValue>, CacheError> {
        self.bounded("HGETALL", self.inner.hgetall(key)).await
    }

    async fn hset(&self, key: &str, fields: &[(String, CacheValue)]) -> Result<(), CacheError> {
        self.bounded("HSET", self.inner.hset(key, fields)).await
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.bounded("EXISTS", self.inner.exists(key)).await
    }

    async fn del(&self, key: &str) -> Result<bool, CacheError> {
        self.bounded("DEL", self.inner.del(key)).await
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool, CacheError> {
        self.bounded("EXPIRE", self.inner.expire(key, ttl_seconds))
            .await
    }

    async fn hset_existing(
        &self,
        key: &str,
        field: &str,
        value: CacheValue,
        ttl_seconds: u64,
    ) -> Result<bool, CacheError> {
        self.bounded(
            "HSET_EXISTING",
            self.inner.hset_existing(key, field, value, ttl_seconds),
        )
        .await
    }

    async fn execute(&self, batch: CacheBatch) -> Result<(), CacheError> {
        self.bounded("EXEC", self.inner.execute(batch)).await
    }
}
