//! Cache layer holding the settings snapshot.
//!
//! The snapshot is a single hash keyed by [`SettingsCacheKey`]. Backends:
//! - Memory (in-process, single instance only)
//! - Redis (shared between instances, bb8 pooled)
//!
//! # Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"   # or "memory"
//! namespace = "acme"
//! ttl_seconds = 300
//! operation_timeout_ms = 1000
//!
//! [cache.memory]
//! max_keys = 1024
//!
//! [cache.redis]
//! url = "redis://127.0.0.1:6379"
//! pool_size = 4
//! connection_timeout = 5
//! ```

mod error;
mod key;
mod manager;
mod memory;
mod redis;
mod timed;
mod traits;
mod value;

pub use error::CacheError;
pub use key::SettingsCacheKey;
pub use manager::build_cache_store;
pub use memory::MemoryCacheStore;
pub use self::redis::RedisCacheStore;
pub use timed::TimeBoundCache;
pub use traits::{CacheBatch, CacheCommand, CacheStore, MAX_TTL_SECONDS, check_ttl};
pub use value::{CacheValue, decode_flag};
