//! Authorization of settings mutations.

use std::collections::HashSet;
use std::fmt;

use crate::config::AccessConfig;

/// Who is performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Actor {
    name: String,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A mutation an actor asks to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessAction {
    Add,
    Set,
    Toggle,
    Rename,
    Remove,
}

impl AccessAction {
    /// Audit `action_type` of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessAction::Add => "setting.add",
            AccessAction::Set => "setting.set",
            AccessAction::Toggle => "setting.toggle",
            AccessAction::Rename => "setting.rename",
            AccessAction::Remove => "setting.remove",
        }
    }
}

impl fmt::Display for AccessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny { reason: String },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

pub trait Authorizer: Send + Sync {
    fn authorize(&self, actor: &Actor, action: &AccessAction) -> AccessDecision;
}

/// Allows the actors listed in `access.admins`.
///
/// An empty list allows every actor.
#[derive(Debug, Clone, Default)]
pub struct AdminListAuthorizer {
    admins: HashSet<String>,
}

impl AdminListAuthorizer {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            admins: admins
                .into_iter()
                .map(|name| name.as_ref().trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &AccessConfig) -> Self {
        Self::new(&config.admins)
    }
}

impl Authorizer for AdminListAuthorizer {
    fn authorize(&self, actor: &Actor, action: &AccessAction) -> AccessDecision {
        if self.admins.is_empty() || self.admins.contains(actor.name()) {
            AccessDecision::Allow
        } else {
            AccessDecision::Deny {
                reason: format!("'{}' may not perform {}", actor, action),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_admin_list_allows_everyone() {
        let authz = AdminListAuthorizer::from_config(&AccessConfig::default());
        assert!(authz
            .authorize(&Actor::new("anyone"), &AccessAction::Remove)
            .is_allowed());
    }

    #[test]
    fn test_admin_list_denies_others() {
        let authz = AdminListAuthorizer::new(["alice", " bob "]);

        assert!(authz.authorize(&Actor::new("bob"), &AccessAction::Add).is_allowed());
        let decision = authz.authorize(&Actor::new("mallory"), &AccessAction::Toggle);
        assert_eq!(
            decision,
            AccessDecision::Deny {
                reason: "'mallory' may not perform setting.toggle".to_string()
            }
        );
    }
}
