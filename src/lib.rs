//! Flagstone library
//!
//! Boolean settings kept coherent between PostgreSQL and a cached snapshot.

pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod logger;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;

pub use engine::SettingsCacheEngine;
pub use state::AppState;
