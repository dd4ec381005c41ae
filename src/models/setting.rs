//! Setting model and key normalization.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Longest key the `settings.key` column accepts.
pub const MAX_KEY_LENGTH: usize = 255;

/// A single boolean setting row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SettingRecord {
    pub key: String,
    pub value: bool,
}

impl SettingRecord {
    pub fn new(key: impl Into<String>, value: bool) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Case-normalize a setting key: trimmed, upper-case.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Normalize and check a key supplied by a caller.
///
/// Keys become hash field names in the snapshot, so whitespace and the `:`
/// separator are refused.
pub fn validate_key(raw: &str) -> AppResult<String> {
    let key = normalize_key(raw);

    let reason = if key.is_empty() {
        Some("Setting key cannot be empty".to_string())
    } else if key.chars().count() > MAX_KEY_LENGTH {
        Some(format!("Setting key cannot exceed {} characters", MAX_KEY_LENGTH))
    } else if key.chars().any(char::is_whitespace) {
        Some("Setting key cannot contain whitespace".to_string())
    } else if key.contains(':') {
        Some("Setting key cannot contain ':'".to_string())
    } else {
        None
    };

    match reason {
        Some(reason) => Err(AppError::Validation {
            field: "key".to_string(),
            reason,
        }),
        None => Ok(key),
    }
}
