//! Cache error types.

use thiserror::Error;

/// Errors raised by a cache store.
///
/// Every variant means the cache could not answer; read paths treat all of
/// them as "store unavailable" and fall back to the durable store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache operation failed: {0}")]
    Operation(String),

    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Cache operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },
}
