//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Administer boolean settings backed by PostgreSQL and a shared cache
#[derive(Parser, Debug)]
#[command(name = "flagstone")]
#[command(about = "Administer boolean settings backed by PostgreSQL and a shared cache")]
#[command(long_about = "
flagstone manages boolean settings (feature flags and route-access toggles)
stored in PostgreSQL and served from a cached snapshot in Redis or memory.
Every change is written to the database, audited, and followed by a rebuild
of the snapshot.

EXAMPLES:
    # Apply pending database migrations
    flagstone migrate

    # Show every setting as the cache serves it
    flagstone list

    # Create a disabled setting, then enable it
    flagstone add beta_checkout
    flagstone set beta_checkout true

    # Use a specific configuration file and environment
    flagstone --config /etc/flagstone/production.toml --env prod list

    # Force a snapshot rebuild
    flagstone reload
")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    ///
    /// Load this single TOML file instead of the layered `config/` directory.
    /// The file must exist and be readable.
    ///
    /// Example: --config /etc/flagstone/production.toml
    #[arg(short, long, global = true, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects the `{environment}.toml` layer and the environment part of the
    /// cache key. Defaults to FLAGSTONE_APP_ENV, then development.
    #[arg(short, long, global = true, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Name recorded in the audit trail for mutations
    #[arg(long, global = true, env = "USER", default_value = "cli", value_name = "NAME")]
    pub actor: String,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Database migration operations
    ///
    /// Examples:
    ///   flagstone migrate            # Apply all pending migrations
    ///   flagstone migrate --dry-run  # Show pending migrations without applying
    Migrate {
        /// Show pending migrations without applying
        #[arg(long)]
        dry_run: bool,
    },
    /// Print every setting
    List {
        /// Print a JSON object instead of one line per setting
        #[arg(long)]
        json: bool,
    },
    /// Print whether one setting is enabled
    Get {
        #[arg(value_parser = super::validation::validate_setting_key)]
        key: String,
    },
    /// Create a setting (disabled unless --enabled)
    Add {
        #[arg(value_parser = super::validation::validate_setting_key)]
        key: String,

        #[arg(long)]
        enabled: bool,
    },
    /// Set the value of an existing setting
    Set {
        #[arg(value_parser = super::validation::validate_setting_key)]
        key: String,

        /// true/false, on/off, yes/no or 1/0
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        value: bool,
    },
    /// Flip an existing setting
    Toggle {
        #[arg(value_parser = super::validation::validate_setting_key)]
        key: String,
    },
    /// Move a setting to a new key
    Rename {
        #[arg(value_parser = super::validation::validate_setting_key)]
        old: String,

        #[arg(value_parser = super::validation::validate_setting_key)]
        new: String,
    },
    /// Delete a setting
    Remove {
        #[arg(value_parser = super::validation::validate_setting_key)]
        key: String,
    },
    /// Drop the cached snapshot and rebuild it from the database
    Reload,
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
