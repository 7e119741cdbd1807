//! Fleet event record and the payload handed to listeners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Immutable record of one bus emission.
///
/// Every call to [`EventBus::emit`](super::EventBus::emit) creates one and
/// keeps it addressable by `id`. Only `processed` is reserved for later
/// mutation by consumers; this crate never changes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetEvent {
    /// Unique event identifier (UUID v4).
    pub id: String,

    /// Event type, e.g. `task:completed`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Emitter of the event.
    pub source: String,

    /// Optional addressee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Opaque payload.
    #[serde(default)]
    pub data: Value,

    /// UTC creation time.
    pub timestamp: DateTime<Utc>,

    pub processed: bool,
}

impl FleetEvent {
    /// Create a new event with a fresh id and the current time.
    pub fn new(
        event_type: impl Into<String>,
        source: impl Into<String>,
        data: Value,
        target: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type: event_type.into(),
            source: source.into(),
            target,
            data,
            timestamp: Utc::now(),
            processed: false,
        }
    }

    /// The view of this event passed to listeners.
    pub fn payload(&self) -> EventPayload {
        EventPayload {
            event_id: self.id.clone(),
            source: self.source.clone(),
            target: self.target.clone(),
            data: self.data.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// What a listener receives for each emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub event_id: String,
    pub source: String,
    pub target: Option<String>,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_event_defaults() {
        let event = FleetEvent::new("agent:spawned", "fleet-manager", json!({"a": 1}), None);
        assert!(!event.id.is_empty());
        assert!(Uuid::parse_str(&event.id).is_ok());
        assert_eq!(event.event_type, "agent:spawned");
        assert!(!event.processed);
        assert!(event.target.is_none());
    }

    #[test]
    fn test_payload_mirrors_event() {
        let event = FleetEvent::new(
            "task:completed",
            "agent-456",
            json!({"taskId": "task-123"}),
            Some("all-agents".to_string()),
        );
        let payload = event.payload();
        assert_eq!(payload.event_id, event.id);
        assert_eq!(payload.source, "agent-456");
        assert_eq!(payload.target.as_deref(), Some("all-agents"));
        assert_eq!(payload.data, event.data);
        assert_eq!(payload.timestamp, event.timestamp);
    }

    #[test]
    fn test_serializes_type_field_name() {
        let event = FleetEvent::new("fleet:status", "fleet-manager", Value::Null, None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "fleet:status");
        assert!(json.get("target").is_none());
        assert_eq!(json["processed"], false);
    }
}
