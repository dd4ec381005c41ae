//! Audit trail for settings mutations.

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// One recorded administrative action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor: String,
    pub action_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    pub occurred_at: Timestamp,
}

impl AuditEvent {
    /// Event stamped with the current time.
    pub fn new(
        actor: impl Into<String>,
        action_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            action_type: action_type.into(),
            description: description.into(),
            meta: None,
            occurred_at: Timestamp::now(),
        }
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Destination of audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> AppResult<()>;
}

/// Writes audit events as structured `info` records on the `audit` target.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> AppResult<()> {
        let meta = event
            .meta
            .as_ref()
            .map(serde_json::Value::to_string)
            .unwrap_or_default();

        tracing::info!(
            target: "audit",
            actor = %event.actor,
            action_type = %event.action_type,
            occurred_at = %event.occurred_at,
            meta = %meta,
            "{}",
            event.description
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serializes_without_empty_meta() {
        let event = AuditEvent::new("alice", "setting.toggle", "Toggled BETA");
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["actor"], "alice");
        assert_eq!(value["action_type"], "setting.toggle");
        assert!(value.get("meta").is_none());
        assert!(value["occurred_at"].is_string());
    }

    #[tokio::test]
    async fn test_tracing_sink_accepts_events() {
        let event = AuditEvent::new("alice", "setting.add", "Added BETA")
            .with_meta(json!({ "key": "BETA", "value": true }));

        TracingAuditSink.record(event).await.unwrap();
    }
}
