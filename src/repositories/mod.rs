//! Repository layer for data access operations.
//!
//! Provides async CRUD operations over the `settings` table behind the
//! [`SettingsStore`] trait.

mod setting_repo;
mod timed;
mod traits;

pub use setting_repo::SettingRepository;
pub use timed::TimeBoundStore;
pub use traits::SettingsStore;
