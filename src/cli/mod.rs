//! CLI module for flagstone
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing with clap
//! - Configuration loading driven by `--config` and `--env`
//! - Command handlers for migrations and settings administration

pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment};

use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment as AppEnvironment, Settings};

/// Load configuration for the parsed command line
///
/// `--config` switches to single-file mode and `--env` overrides
/// `FLAGSTONE_APP_ENV`. Returns the validated settings together with the
/// environment they were loaded for.
///
/// # Errors
/// Returns error if configuration loading or validation fails
pub fn load_config(cli: &Cli) -> Result<(Settings, AppEnvironment), ConfigError> {
    let mut loader = ConfigLoader::new()?;
    if let Some(env) = cli.env {
        loader = loader.with_environment(env.into());
    }
    if let Some(path) = &cli.config {
        loader = loader.with_config_file(path.clone());
    }

    let environment = loader.environment();
    let settings = loader.load()?;
    Ok((settings, environment))
}
