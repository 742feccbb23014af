use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    LocationPing,
    StatusChange,
}

/// Append-only audit entry. Written on every ping and status change,
/// broadcast to websocket subscribers, never read back by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub driver_id: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl DriverEvent {
    pub fn new(kind: EventKind, driver_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            driver_id: driver_id.into(),
            payload,
            created_at: Utc::now(),
        }
    }
}
