//! Settings command handler
//!
//! Runs the read and mutation subcommands against a built [`AppState`].

use crate::cli::parser::Commands;
use crate::error::{AppError, AppResult};
use crate::services::Actor;
use crate::state::AppState;

/// Handler for every subcommand that goes through the settings engine
pub struct SettingsCommandHandler {
    state: AppState,
    actor: Actor,
}

impl SettingsCommandHandler {
    pub fn new(state: AppState, actor: Actor) -> Self {
        Self { state, actor }
    }

    /// Execute one subcommand and return the text to print.
    pub async fn execute(&self, command: &Commands) -> AppResult<String> {
        let access = &self.state.route_access;

        match command {
            Commands::List { json } => {
                let all = access.list().await;
                if *json {
                    return serde_json::to_string_pretty(&all).map_err(|e| AppError::Internal {
                        source: anyhow::Error::new(e),
                    });
                }
                Ok(all
                    .iter()
                    .map(|(key, enabled)| format!("{} = {}", key, enabled))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            Commands::Get { key } => Ok(format!("{} = {}", key, access.is_enabled(key).await)),
            Commands::Add { key, enabled } => {
                let record = access.add(&self.actor, key, *enabled).await?;
                Ok(format!("✓ Added {} = {}", record.key, record.value))
            }
            Commands::Set { key, value } => {
                let record = access.set(&self.actor, key, *value).await?;
                Ok(format!("✓ Set {} = {}", record.key, record.value))
            }
            Commands::Toggle { key } => {
                let record = access.toggle(&self.actor, key).await?;
                Ok(format!("✓ Toggled {} to {}", record.key, record.value))
            }
            Commands::Rename { old, new } => {
                let record = access.rename(&self.actor, old, new).await?;
                Ok(format!("✓ Renamed {} to {}", old, record.key))
            }
            Commands::Remove { key } => {
                access.remove(&self.actor, key).await?;
                Ok(format!("✓ Removed {}", key))
            }
            Commands::Reload => {
                let records = self.state.engine.invalidate().await?;
                Ok(format!(
                    "✓ Reloaded {} setting(s) into {}",
                    records,
                    self.state.engine.cache_key()
                ))
            }
            Commands::Migrate { .. } => Err(AppError::Validation {
                field: "command".to_string(),
                reason: "migrate does not run through the settings engine".to_string(),
            }),
        }
    }
}
