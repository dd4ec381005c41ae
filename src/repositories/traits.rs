//! SettingsStore trait definition.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::SettingRecord;

/// Durable store of setting rows.
///
/// Keys passed in are already normalized. Implementations report a missing
/// key as `AppError::NotFound` and a taken key as `AppError::Conflict`.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Every row, ordered by key.
    async fn list_all(&self) -> AppResult<Vec<SettingRecord>>;

    async fn find(&self, key: &str) -> AppResult<Option<SettingRecord>>;

    /// Create a row; `Conflict` if the key exists.
    async fn insert(&self, record: SettingRecord) -> AppResult<SettingRecord>;

    /// Change the value of an existing row; `NotFound` if absent.
    async fn update(&self, key: &str, value: bool) -> AppResult<SettingRecord>;

    /// Flip the value of an existing row in one statement; `NotFound` if
    /// absent. Returns the row with its new value.
    async fn toggle(&self, key: &str) -> AppResult<SettingRecord>;

    /// Create or overwrite a row.
    async fn upsert(&self, key: &str, value: bool) -> AppResult<SettingRecord>;

    /// Move a row to a new key, keeping its value.
    ///
    /// `NotFound` if `old_key` is absent, `Conflict` if `new_key` is taken.
    async fn rename(&self, old_key: &str, new_key: &str) -> AppResult<SettingRecord>;

    /// Delete a row. Returns whether it existed.
    async fn delete(&self, key: &str) -> AppResult<bool>;
}
