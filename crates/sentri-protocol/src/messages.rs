//! WebSocket envelope: `{ "type": string, ...payload }` records in both
//! directions.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Alert, CameraFrame, CameraStatusReport, CrowdUpdate};
use crate::ProtocolError;

/// Lifecycle topics emitted by the client itself.
pub mod lifecycle {
    pub const CONNECTED: &str = "connected";
    pub const DISCONNECTED: &str = "disconnected";
    pub const RECONNECT_FAILED: &str = "reconnect_failed";
    pub const ERROR: &str = "error";
    /// Catch-all topic receiving every inbound message after its typed subscribers.
    pub const MESSAGE: &str = "message";
}

/// Inbound message types known to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    CameraFrame,
    CameraStatus,
    CrowdUpdate,
    Alert,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::CameraFrame,
        Topic::CameraStatus,
        Topic::CrowdUpdate,
        Topic::Alert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CameraFrame => "camera_frame",
            Self::CameraStatus => "camera_status",
            Self::CrowdUpdate => "crowd_update",
            Self::Alert => "alert",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownTopic(s.to_string()))
    }
}

/// A parsed inbound frame. `payload` holds the whole record, `type` included.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    kind: String,
    payload: Map<String, Value>,
}

impl InboundMessage {
    /// Parse a text frame. Fails for non-JSON, non-object frames and frames
    /// without a string `type` field.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(payload) = value else {
            return Err(ProtocolError::Malformed("expected a JSON object".into()));
        };
        let kind = match payload.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            _ => return Err(ProtocolError::MissingType),
        };
        Ok(Self { kind, payload })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn topic(&self) -> Option<Topic> {
        self.kind.parse().ok()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Decode the record into a typed payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        Ok(serde_json::from_value(Value::Object(self.payload.clone()))?)
    }
}

/// Typed view of an inbound message for the known topics.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveMessage {
    CameraFrame(CameraFrame),
    CameraStatus(CameraStatusReport),
    CrowdUpdate(CrowdUpdate),
    Alert(Alert),
}

impl LiveMessage {
    pub fn topic(&self) -> Topic {
        match self {
            Self::CameraFrame(_) => Topic::CameraFrame,
            Self::CameraStatus(_) => Topic::CameraStatus,
            Self::CrowdUpdate(_) => Topic::CrowdUpdate,
            Self::Alert(_) => Topic::Alert,
        }
    }
}

impl TryFrom<&InboundMessage> for LiveMessage {
    type Error = ProtocolError;

    fn try_from(msg: &InboundMessage) -> Result<Self, Self::Error> {
        let topic: Topic = msg.kind().parse()?;
        Ok(match topic {
            Topic::CameraFrame => Self::CameraFrame(msg.decode()?),
            Topic::CameraStatus => Self::CameraStatus(msg.decode()?),
            Topic::CrowdUpdate => Self::CrowdUpdate(msg.decode::<CrowdUpdate>()?.normalized()),
            Topic::Alert => Self::Alert(msg.decode()?),
        })
    }
}

/// Commands sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundCommand {
    SubscribeCamera { camera_id: String },
    UnsubscribeCamera { camera_id: String },
    SubscribeAlerts,
}

impl OutboundCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SubscribeCamera { .. } => "subscribe_camera",
            Self::UnsubscribeCamera { .. } => "unsubscribe_camera",
            Self::SubscribeAlerts => "subscribe_alerts",
        }
    }
}
