//! Setting repository for async database operations.
//!
//! Provides the `settings` table operations using diesel_async.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::SettingRecord;
use crate::repositories::SettingsStore;
use crate::schema::settings;

/// Setting repository holding an async connection pool.
///
/// Since `AsyncDbPool` (bb8::Pool) internally uses `Arc`, cloning is cheap.
#[derive(Clone)]
pub struct SettingRepository {
    pool: AsyncDbPool,
}

impl SettingRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> AppResult<PooledConnection<'_, AsyncPgConnection>> {
        self.pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::new(e),
            })
    }
}

#[async_trait]
impl SettingsStore for SettingRepository {
    async fn list_all(&self) -> AppResult<Vec<SettingRecord>> {
        let mut conn = self.conn().await?;

        settings::table
            .select(SettingRecord::as_select())
            .order(settings::key.asc())
            .load(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "list settings"))
    }

    async fn find(&self, key: &str) -> AppResult<Option<SettingRecord>> {
        let mut conn = self.conn().await?;

        settings::table
            .find(key)
            .select(SettingRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| DatabaseErrorConverter::convert_setting_error(e, "find setting", key))
    }

    async fn insert(&self, record: SettingRecord) -> AppResult<SettingRecord> {
        let mut conn = self.conn().await?;

        diesel::insert_into(settings::table)
            .values(&record)
            .returning(SettingRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| {
                DatabaseErrorConverter::convert_setting_error(e, "insert setting", &record.key)
            })
    }

    async fn update(&self, key: &str, value: bool) -> AppResult<SettingRecord> {
        let mut conn = self.conn().await?;

        diesel::update(settings::table.find(key))
            .set((
                settings::value.eq(value),
                settings::updated_at.eq(diesel::dsl::now),
            ))
            .returning(SettingRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_setting_error(e, "update setting", key))
    }

    async fn toggle(&self, key: &str) -> AppResult<SettingRecord> {
        let mut conn = self.conn().await?;

        diesel::update(settings::table.find(key))
            .set((
                settings::value.eq(diesel::dsl::not(settings::value)),
                settings::updated_at.eq(diesel::dsl::now),
            ))
            .returning(SettingRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_setting_error(e, "toggle setting", key))
    }

    async fn upsert(&self, key: &str, value: bool) -> AppResult<SettingRecord> {
        let mut conn = self.conn().await?;

        diesel::insert_into(settings::table)
            .values(&SettingRecord::new(key, value))
            .on_conflict(settings::key)
            .do_update()
            .set((
                settings::value.eq(value),
                settings::updated_at.eq(diesel::dsl::now),
            ))
            .returning(SettingRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_setting_error(e, "upsert setting", key))
    }

    async fn rename(&self, old_key: &str, new_key: &str) -> AppResult<SettingRecord> {
        let mut conn = self.conn().await?;

        diesel::update(settings::table.find(old_key))
            .set((
                settings::key.eq(new_key),
                settings::updated_at.eq(diesel::dsl::now),
            ))
            .returning(SettingRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| match e {
                DieselError::NotFound => AppError::setting_not_found(old_key),
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    AppError::setting_conflict(new_key)
                }
                other => DatabaseErrorConverter::convert_diesel_error(other, "rename setting"),
            })
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        let mut conn = self.conn().await?;

        let affected = diesel::delete(settings::table.find(key))
            .execute(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_setting_error(e, "delete setting", key))?;
        Ok(affected > 0)
    }
}
