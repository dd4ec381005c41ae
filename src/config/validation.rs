//! Configuration validation logic
//!
//! Validation runs once after loading so that the engine never starts with
//! values it cannot honor (zero TTLs, empty namespaces, unusable URLs).

use crate::cache::MAX_TTL_SECONDS;
use crate::config::error::ConfigError;
use crate::config::settings::{
    AccessConfig, CacheBackend, CacheConfig, DatabaseConfig, LoggerSettings, Settings,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// # Validation Rules
    /// - URL must not be empty and must use a PostgreSQL scheme
    /// - Max connections must be greater than 0
    /// - Min connections must not exceed max connections
    /// - Query timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Please specify a valid database connection string.",
            ));
        }

        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        if self.query_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "database.query_timeout_ms",
                "Query timeout must be greater than 0 milliseconds.",
            ));
        }

        Ok(())
    }
}

impl CacheConfig {
    /// Validate cache configuration
    ///
    /// The namespace becomes part of the snapshot key, so it may not contain
    /// the `:` separator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let namespace = self.namespace.trim();
        if namespace.is_empty() {
            return Err(ConfigError::validation(
                "cache.namespace",
                "Cache namespace cannot be empty.",
            ));
        }
        if namespace.contains(':') {
            return Err(ConfigError::validation(
                "cache.namespace",
                "Cache namespace cannot contain ':'.",
            ));
        }

        if self.ttl_seconds == 0 {
            return Err(ConfigError::validation(
                "cache.ttl_seconds",
                "Snapshot TTL must be greater than 0 seconds.",
            ));
        }
        if self.ttl_seconds > MAX_TTL_SECONDS {
            return Err(ConfigError::validation(
                "cache.ttl_seconds",
                format!("Snapshot TTL cannot exceed {} seconds.", MAX_TTL_SECONDS),
            ));
        }

        if self.operation_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "cache.operation_timeout_ms",
                "Cache operation timeout must be greater than 0 milliseconds.",
            ));
        }

        match self.backend {
            CacheBackend::Memory => {
                if self.memory.max_keys == 0 {
                    return Err(ConfigError::validation(
                        "cache.memory.max_keys",
                        "Memory cache must hold at least one key.",
                    ));
                }
            }
            CacheBackend::Redis => {
                let url = &self.redis.url;
                if !url.starts_with("redis://")
                    && !url.starts_with("rediss://")
                    && !url.starts_with("redis+unix://")
                    && !url.starts_with("unix://")
                {
                    return Err(ConfigError::ValidationError {
                        field: "cache.redis.url".to_string(),
                        message: format!("Invalid Redis URL '{}'", url),
                    });
                }
                if self.redis.pool_size == 0 {
                    return Err(ConfigError::validation(
                        "cache.redis.pool_size",
                        "Redis pool size must be greater than 0.",
                    ));
                }
            }
        }

        Ok(())
    }
}

impl AccessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admins.iter().any(|admin| admin.trim().is_empty()) {
            return Err(ConfigError::validation(
                "access.admins",
                "Admin names cannot be blank.",
            ));
        }
        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.to_lowercase();
        // Filter directives such as "flagstone=debug" are handed to EnvFilter as is
        if !level.contains('=') && !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if self.file.enabled && self.file.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate every section
    ///
    /// The database section is checked separately by commands that actually
    /// connect, so configuration for memory-only tooling stays loadable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        self.access.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}
