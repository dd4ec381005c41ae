//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use super::handlers::{MigrateCommandHandler, SettingsCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::{Environment, Settings};
use crate::error::AppResult;
use crate::services::Actor;
use crate::state::AppState;

/// Execute a CLI command with the given settings
///
/// `migrate` only needs the database section; every other command builds
/// the full [`AppState`] first.
///
/// # Returns
/// The report to print on success
pub async fn execute_command(
    cli: &Cli,
    settings: Settings,
    environment: Environment,
) -> AppResult<String> {
    match &cli.command {
        Commands::Migrate { dry_run } => {
            MigrateCommandHandler::new(settings.database)
                .execute(*dry_run)
                .await
        }
        command => {
            let state = AppState::build(&settings, environment).await?;
            SettingsCommandHandler::new(state, Actor::new(cli.actor.as_str()))
                .execute(command)
                .await
        }
    }
}
