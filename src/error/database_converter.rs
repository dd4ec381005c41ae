use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::error::AppError;

/// Utility for converting database errors to structured AppError variants.
///
/// The settings table has a single unique constraint (its primary key), so a
/// unique violation always means the setting key is already taken.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info, operation, None)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    /// Converts a Diesel error raised while writing the setting `key`.
    ///
    /// Not-found and unique violations are reported against the key itself.
    pub fn convert_setting_error(error: DieselError, operation: &str, key: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info, operation, Some(key))
            }
            DieselError::NotFound => AppError::setting_not_found(key),
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: Box<dyn diesel::result::DatabaseErrorInformation + Send + Sync>,
        operation: &str,
        key: Option<&str>,
    ) -> AppError {
        let message = info.message().to_string();

        match (kind, key) {
            (DatabaseErrorKind::UniqueViolation, Some(key)) => AppError::setting_conflict(key),
            (DatabaseErrorKind::UniqueViolation, None) => AppError::Conflict {
                entity: "setting".to_string(),
                field: info.constraint_name().unwrap_or("key").to_string(),
                value: "unknown".to_string(),
            },
            (DatabaseErrorKind::NotNullViolation, _) => AppError::Validation {
                field: info.column_name().unwrap_or("value").to_string(),
                reason: "Field is required for setting".to_string(),
            },
            (DatabaseErrorKind::CheckViolation, _) => AppError::Validation {
                field: info.constraint_name().unwrap_or("key").to_string(),
                reason: format!("Check constraint failed: {}", message),
            },
            _ => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::msg(format!("Database error: {}", message)),
            },
        }
    }
}
