//! Migrate command handler
//!
//! Applies the embedded diesel migrations, or lists the pending ones.

use crate::config::settings::DatabaseConfig;
use crate::db::{pending_migrations, run_pending_migrations};
use crate::error::AppResult;

/// Handler for the migrate command
pub struct MigrateCommandHandler {
    config: DatabaseConfig,
}

impl MigrateCommandHandler {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    /// Execute the migrate command
    ///
    /// # Arguments
    /// * `dry_run` - If true, lists pending migrations without applying them
    ///
    /// # Returns
    /// The report printed by the caller
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Database connection errors
    /// - Migration execution errors
    pub async fn execute(&self, dry_run: bool) -> AppResult<String> {
        self.config.validate()?;

        if dry_run {
            let pending = pending_migrations(&self.config.url).await?;
            return Ok(if pending.is_empty() {
                "✓ No pending migrations found - database is up to date".to_string()
            } else {
                let mut report = format!("Found {} pending migration(s):", pending.len());
                for name in &pending {
                    report.push_str(&format!("\n  - {}", name));
                }
                report.push_str("\n\nRun without --dry-run to apply these migrations");
                report
            });
        }

        tracing::info!("Running database migrations");
        let applied = run_pending_migrations(&self.config.url).await?;

        Ok(if applied.is_empty() {
            "✓ No migrations to apply - database is already up to date".to_string()
        } else {
            let mut report = format!("✓ Applied {} migration(s):", applied.len());
            for name in &applied {
                report.push_str(&format!("\n  - {}", name));
            }
            report
        })
    }
}
