//! Route-access toggles: administrative mutations of settings.
//!
//! Every mutation is authorized, written to the durable store, audited and
//! followed by an invalidation of the settings snapshot, so readers in this
//! process observe the change immediately.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;

use crate::engine::SettingsCacheEngine;
use crate::error::{AppError, AppResult};
use crate::models::{SettingRecord, validate_key};
use crate::repositories::SettingsStore;
use crate::services::{AccessAction, AccessDecision, Actor, AuditEvent, AuditSink, Authorizer};

/// Controller for adding, changing and removing settings.
#[derive(Clone)]
pub struct RouteAccessController {
    store: Arc<dyn SettingsStore>,
    engine: Arc<SettingsCacheEngine>,
    audit: Arc<dyn AuditSink>,
    authorizer: Arc<dyn Authorizer>,
}

impl RouteAccessController {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        engine: Arc<SettingsCacheEngine>,
        audit: Arc<dyn AuditSink>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            store,
            engine,
            audit,
            authorizer,
        }
    }

    /// Creates a new setting.
    ///
    /// # Arguments
    /// * `actor` - Who performs the change
    /// * `key` - Setting key, normalized before use
    /// * `value` - Initial value
    ///
    /// # Returns
    /// The created record, or `Conflict` if the key already exists
    pub async fn add(&self, actor: &Actor, key: &str, value: bool) -> AppResult<SettingRecord> {
        self.authorize(actor, AccessAction::Add)?;
        let key = validate_key(key)?;

        let record = self.store.insert(SettingRecord::new(key, value)).await?;

        self.after_write(
            actor,
            AccessAction::Add,
            format!("Added setting {} = {}", record.key, record.value),
            json!({ "key": record.key, "value": record.value }),
        )
        .await?;
        Ok(record)
    }

    /// Sets the value of an existing setting.
    ///
    /// # Returns
    /// The updated record, or `NotFound` if the key does not exist
    pub async fn set(&self, actor: &Actor, key: &str, value: bool) -> AppResult<SettingRecord> {
        self.authorize(actor, AccessAction::Set)?;
        let key = validate_key(key)?;

        let record = self.store.update(&key, value).await?;

        self.after_write(
            actor,
            AccessAction::Set,
            format!("Set setting {} = {}", record.key, record.value),
            json!({ "key": record.key, "value": record.value }),
        )
        .await?;
        Ok(record)
    }

    /// Flips the value of an existing setting.
    pub async fn toggle(&self, actor: &Actor, key: &str) -> AppResult<SettingRecord> {
        self.authorize(actor, AccessAction::Toggle)?;
        let key = validate_key(key)?;

        let record = self.store.toggle(&key).await?;

        self.after_write(
            actor,
            AccessAction::Toggle,
            format!("Toggled setting {} to {}", record.key, record.value),
            json!({ "key": record.key, "from": !record.value, "to": record.value }),
        )
        .await?;
        Ok(record)
    }

    /// Moves a setting to a new key, keeping its value.
    ///
    /// Renaming a key onto itself (after normalization) changes nothing.
    ///
    /// # Returns
    /// The record under its new key; `NotFound` if `old_key` is absent,
    /// `Conflict` if `new_key` is taken
    pub async fn rename(
        &self,
        actor: &Actor,
        old_key: &str,
        new_key: &str,
    ) -> AppResult<SettingRecord> {
        self.authorize(actor, AccessAction::Rename)?;
        let old_key = validate_key(old_key)?;
        let new_key = validate_key(new_key)?;

        if old_key == new_key {
            return self
                .store
                .find(&old_key)
                .await?
                .ok_or_else(|| AppError::setting_not_found(&old_key));
        }

        let record = self.store.rename(&old_key, &new_key).await?;

        self.after_write(
            actor,
            AccessAction::Rename,
            format!("Renamed setting {} to {}", old_key, new_key),
            json!({ "from": old_key, "to": new_key, "value": record.value }),
        )
        .await?;
        Ok(record)
    }

    /// Deletes a setting; `NotFound` if it does not exist.
    pub async fn remove(&self, actor: &Actor, key: &str) -> AppResult<()> {
        self.authorize(actor, AccessAction::Remove)?;
        let key = validate_key(key)?;

        if !self.store.delete(&key).await? {
            return Err(AppError::setting_not_found(&key));
        }

        self.after_write(
            actor,
            AccessAction::Remove,
            format!("Removed setting {}", key),
            json!({ "key": key }),
        )
        .await
    }

    pub async fn is_enabled(&self, key: &str) -> bool {
        self.engine.get_one(key).await
    }

    pub async fn list(&self) -> BTreeMap<String, bool> {
        self.engine.get_all().await
    }

    fn authorize(&self, actor: &Actor, action: AccessAction) -> AppResult<()> {
        match self.authorizer.authorize(actor, &action) {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny { reason } => {
                tracing::warn!(
                    actor = %actor,
                    action = %action,
                    reason = %reason,
                    "Settings mutation denied"
                );
                Err(AppError::Forbidden { message: reason })
            }
        }
    }

    async fn after_write(
        &self,
        actor: &Actor,
        action: AccessAction,
        description: String,
        meta: serde_json::Value,
    ) -> AppResult<()> {
        let event = AuditEvent::new(actor.name(), action.as_str(), description).with_meta(meta);
        if let Err(e) = self.audit.record(event).await {
            tracing::warn!(
                actor = %actor,
                action = %action,
                error = %e,
                "Failed to record audit event"
            );
        }

        self.engine.invalidate().await?;
        Ok(())
    }
}
