//! Settings cache-coherency engine.
//!
//! [`SettingsCacheEngine`] serves boolean settings from a cached snapshot
//! hash, rebuilding it from the durable store on a miss, after expiry and
//! after every invalidation.

mod error;
mod settings_cache;
mod single_flight;

#[cfg(test)]
mod tests;

pub use error::ReloadError;
pub use settings_cache::SettingsCacheEngine;
