//! CacheStore trait definition.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::cache::{CacheError, CacheValue};

/// Longest TTL any backend accepts, one year.
pub const MAX_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Reject TTLs a backend cannot represent as an expiry.
pub fn check_ttl(ttl_seconds: u64) -> Result<u64, CacheError> {
    if ttl_seconds > MAX_TTL_SECONDS {
        return Err(CacheError::Operation(format!(
            "TTL of {ttl_seconds}s exceeds the {MAX_TTL_SECONDS}s maximum"
        )));
    }
    Ok(ttl_seconds)
}

/// Hash-map operations with expiry over a key-value cache.
///
/// All cache backends must implement this trait to provide a unified interface.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read one field of a hash. `None` when the field or the key is absent.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<CacheValue>, CacheError>;

    /// Read every field of a hash. Empty when the key is absent.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, CacheValue>, CacheError>;

    /// Write fields into a hash, creating it if needed. Existing TTL is kept.
    async fn hset(&self, key: &str, fields: &[(String, CacheValue)]) -> Result<(), CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Delete a key. Returns whether it existed.
    async fn del(&self, key: &str) -> Result<bool, CacheError>;

    /// Set a TTL on a key. Returns `false` when the key does not exist.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool, CacheError>;

    /// Write one field and refresh the TTL, only if the hash exists.
    ///
    /// The existence check and the write happen as one unit. Returns whether
    /// the hash was updated.
    async fn hset_existing(
        &self,
        key: &str,
        field: &str,
        value: CacheValue,
        ttl_seconds: u64,
    ) -> Result<bool, CacheError>;

    /// Execute every command of the batch as one unit.
    ///
    /// Either all commands take effect or none do.
    async fn execute(&self, batch: CacheBatch) -> Result<(), CacheError>;
}

/// A single command inside a [`CacheBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCommand {
    Del {
        key: String,
    },
    HSet {
        key: String,
        fields: Vec<(String, CacheValue)>,
    },
    Expire {
        key: String,
        ttl_seconds: u64,
    },
}

/// Ordered list of commands executed atomically by [`CacheStore::execute`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheBatch {
    commands: Vec<CacheCommand>,
}

impl CacheBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn del(mut self, key: impl Into<String>) -> Self {
        self.commands.push(CacheCommand::Del { key: key.into() });
        self
    }

    pub fn hset(mut self, key: impl Into<String>, fields: Vec<(String, CacheValue)>) -> Self {
        self.commands.push(CacheCommand::HSet {
            key: key.into(),
            fields,
        });
        self
    }

    pub fn expire(mut self, key: impl Into<String>, ttl_seconds: u64) -> Self {
        self.commands.push(CacheCommand::Expire {
            key: key.into(),
            ttl_seconds,
        });
        self
    }

    pub fn into_commands(self) -> Vec<CacheCommand> {
        self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
