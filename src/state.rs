//! Application state wiring the settings engine together.
//!
//! Every client (database pool, cache store) is constructed here and injected
//! downwards; nothing below this module creates its own connections.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheStore, SettingsCacheKey, TimeBoundCache, build_cache_store};
use crate::config::{Environment, Settings};
use crate::db::{establish_async_connection_pool, run_pending_migrations};
use crate::engine::SettingsCacheEngine;
use crate::error::AppResult;
use crate::repositories::{SettingRepository, SettingsStore, TimeBoundStore};
use crate::services::{AdminListAuthorizer, AuditSink, RouteAccessController, TracingAuditSink};

/// Shared handles built once at startup.
///
/// Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub environment: Environment,
    pub engine: Arc<SettingsCacheEngine>,
    pub route_access: RouteAccessController,
}

impl AppState {
    /// Connect to PostgreSQL and the configured cache, then build the engine.
    ///
    /// Runs pending migrations first when `database.auto_migrate` is set.
    ///
    /// # Errors
    /// - `AppError::Configuration` if the database section is invalid
    /// - `AppError::Database` / `AppError::ConnectionPool` if PostgreSQL is unreachable
    /// - `AppError::Cache` if the cache backend cannot be reached
    pub async fn build(settings: &Settings, environment: Environment) -> AppResult<Self> {
        settings.database.validate()?;

        if settings.database.auto_migrate {
            let applied = run_pending_migrations(&settings.database.url).await?;
            tracing::info!(applied = applied.len(), "Pending migrations applied");
        }

        let pool = establish_async_connection_pool(&settings.database).await?;
        let cache = build_cache_store(&settings.cache).await?;
        let store: Arc<dyn SettingsStore> = Arc::new(SettingRepository::new(pool));

        let state = Self::assemble(settings, environment, store, cache);

        tracing::info!(
            environment = %environment,
            cache_key = %state.engine.cache_key(),
            backend = ?settings.cache.backend,
            "Settings engine ready"
        );
        Ok(state)
    }

    /// Build the engine and controller over already constructed stores.
    ///
    /// Applies the configured time bounds to both stores.
    pub fn assemble(
        settings: &Settings,
        environment: Environment,
        store: Arc<dyn SettingsStore>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let store: Arc<dyn SettingsStore> = Arc::new(TimeBoundStore::new(
            store,
            Duration::from_millis(settings.database.query_timeout_ms),
        ));
        let cache: Arc<dyn CacheStore> = Arc::new(TimeBoundCache::new(
            cache,
            Duration::from_millis(settings.cache.operation_timeout_ms),
        ));

        let engine = Arc::new(SettingsCacheEngine::new(
            Arc::clone(&store),
            cache,
            SettingsCacheKey::from_settings(settings, environment),
            settings.cache.ttl_seconds,
        ));

        let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
        let route_access = RouteAccessController::new(
            store,
            Arc::clone(&engine),
            audit,
            Arc::new(AdminListAuthorizer::from_config(&settings.access)),
        );

        Self {
            environment,
            engine,
            route_access,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::error::AppError;
    use crate::services::Actor;
    use crate::test_support::MemorySettingsStore;

    fn assemble(settings: &Settings, store: Arc<MemorySettingsStore>) -> AppState {
        AppState::assemble(
            settings,
            Environment::Test,
            store,
            Arc::new(MemoryCacheStore::new(&settings.cache.memory)),
        )
    }

    #[tokio::test]
    async fn test_assembled_state_serves_and_mutates() {
        let mut settings = Settings::default();
        settings.cache.namespace = "acme".to_string();
        let store = Arc::new(MemorySettingsStore::with_rows([("CHECKOUT", false)]));
        let state = assemble(&settings, store.clone());

        assert_eq!(state.engine.cache_key().as_str(), "test:acme:false");
        assert!(!state.route_access.is_enabled("checkout").await);

        state
            .route_access
            .toggle(&Actor::new("ops"), "checkout")
            .await
            .unwrap();
        assert!(state.route_access.is_enabled("CHECKOUT").await);
        assert_eq!(store.value("CHECKOUT"), Some(true));
    }

    #[tokio::test]
    async fn test_access_list_comes_from_settings() {
        let mut settings = Settings::default();
        settings.access.admins = vec!["alice".to_string()];
        let state = assemble(&settings, Arc::new(MemorySettingsStore::new()));

        let err = state
            .route_access
            .add(&Actor::new("bob"), "NEW_FLAG", true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_build_rejects_missing_database_url() {
        let settings = Settings::default();
        assert!(matches!(
            AppState::build(&settings, Environment::Test).await,
            Err(AppError::Configuration { .. })
        ));
    }
}
