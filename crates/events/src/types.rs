//! Event types streamed to provisioning clients

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Status carried by a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Phase is active; may repeat.
    Running,
    /// A sub-step inside a still running phase finished; may repeat.
    Success,
    /// Phase finished. Terminal.
    Complete,
    /// Phase failed. Terminal.
    Error,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Running => "running",
            EventStatus::Success => "success",
            EventStatus::Complete => "complete",
            EventStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Complete | EventStatus::Error)
    }
}

/// One line of the live progress stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProgressEvent {
    pub phase: String,
    pub status: EventStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Map<String, Value>>,
}

impl ProgressEvent {
    pub fn new(phase: impl Into<String>, status: EventStatus, message: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn running(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(phase, EventStatus::Running, message)
    }

    pub fn success(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(phase, EventStatus::Success, message)
    }

    pub fn complete(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(phase, EventStatus::Complete, message)
    }

    pub fn error(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(phase, EventStatus::Error, message)
    }

    /// Attach a data map. Non-object values are ignored.
    pub fn with_data(mut self, data: Value) -> Self {
        if let Value::Object(map) = data {
            self.data = Some(map);
        }
        self
    }

    /// Serialized payload of the `data:` line on the wire.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
