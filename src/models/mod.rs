mod setting;

pub use setting::{MAX_KEY_LENGTH, SettingRecord, normalize_key, validate_key};
