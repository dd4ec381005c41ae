//! Snapshot key naming.

use std::fmt;

use crate::config::{Environment, Settings};

/// Cache key of the settings snapshot hash.
///
/// Format: `{environment}:{namespace}:{is_production}`, e.g.
/// `staging:acme:false`. Derived once at bootstrap so every instance of the
/// same deployment and tenant shares one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingsCacheKey(String);

impl SettingsCacheKey {
    pub fn new(environment: Environment, namespace: &str) -> Self {
        Self(format!(
            "{}:{}:{}",
            environment.as_str(),
            namespace.trim(),
            environment.is_production()
        ))
    }

    pub fn from_settings(settings: &Settings, environment: Environment) -> Self {
        Self::new(environment, &settings.cache.namespace)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SettingsCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SettingsCacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
