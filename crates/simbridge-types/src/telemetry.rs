//! Telemetry sent from a simulator to the bridge.
//!
//! Inbound frames are JSON objects discriminated by a `type` field.  Decoding
//! is deliberately loose: anything that is a JSON object is accepted, and
//! only the four kinds the bridge cares about are classified.  Everything
//! else becomes [`TelemetryMessage::Other`] and is dropped by the ingestor
//! without error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::BridgeError;

/// The most recent camera frame reported by a simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    /// Simulator-side timestamp, kept in whatever form the simulator sent.
    pub timestamp: Value,
    /// Encoded image, usually a base64 `data:` URL.
    pub image: Option<String>,
    /// Where the robot was when the frame was taken.
    pub position: Value,
}

impl Capture {
    /// Every stored field except the image payload.
    pub fn metadata(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert("timestamp".to_string(), self.timestamp.clone());
        meta.insert("position".to_string(), self.position.clone());
        meta
    }

    /// Every stored field, image included.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.metadata();
        map.insert(
            "image".to_string(),
            self.image.clone().map(Value::String).unwrap_or(Value::Null),
        );
        map
    }
}

/// The last classified telemetry record seen by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum LatestEvent {
    /// Synthesised when a capture response is stored.
    CaptureAck { timestamp: Value },
    /// The full collision message as received.
    Collision(Map<String, Value>),
    GoalReached(Map<String, Value>),
    Confirmation(Map<String, Value>),
}

impl LatestEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LatestEvent::CaptureAck { .. } => "capture_ack",
            LatestEvent::Collision(_) => "collision",
            LatestEvent::GoalReached(_) => "goal_reached",
            LatestEvent::Confirmation(_) => "confirmation",
        }
    }

    /// JSON object form, as returned by `GET /latest_event`.
    pub fn to_map(&self) -> Map<String, Value> {
        match self {
            LatestEvent::CaptureAck { timestamp } => {
                let mut map = Map::new();
                map.insert("type".to_string(), Value::String("capture_ack".to_string()));
                map.insert("timestamp".to_string(), timestamp.clone());
                map
            }
            LatestEvent::Collision(m) | LatestEvent::GoalReached(m) | LatestEvent::Confirmation(m) => {
                m.clone()
            }
        }
    }
}

/// A decoded simulator frame.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryMessage {
    /// `capture_image_response` – a camera frame.
    CaptureImageResponse(Capture),
    /// `collision` – `collision` is the truthiness of the message's flag.
    Collision {
        collision: bool,
        message: Map<String, Value>,
    },
    GoalReached(Map<String, Value>),
    Confirmation(Map<String, Value>),
    /// Any other `type`, or none at all.
    Other { kind: Option<String> },
}

impl TelemetryMessage {
    /// Decode one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Serialization`] when the frame is not a JSON
    /// object.  Unknown `type` values are not errors.
    pub fn decode(text: &str) -> Result<Self, BridgeError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| BridgeError::Serialization(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(BridgeError::Serialization(
                "telemetry frame is not a JSON object".to_string(),
            ));
        };
        Ok(Self::classify(map))
    }

    fn classify(map: Map<String, Value>) -> Self {
        let kind = map.get("type").and_then(Value::as_str).map(str::to_string);

        match kind.as_deref() {
            Some("capture_image_response") => TelemetryMessage::CaptureImageResponse(Capture {
                timestamp: map.get("timestamp").cloned().unwrap_or(Value::Null),
                image: map.get("image").and_then(Value::as_str).map(str::to_string),
                position: map.get("position").cloned().unwrap_or(Value::Null),
            }),
            Some("collision") => TelemetryMessage::Collision {
                collision: map.get("collision").is_some_and(is_truthy),
                message: map,
            },
            Some("goal_reached") => TelemetryMessage::GoalReached(map),
            Some("confirmation") => TelemetryMessage::Confirmation(map),
            _ => TelemetryMessage::Other { kind },
        }
    }
}

/// JSON truthiness: `false`, `null`, `0`, `""`, `[]` and `{}` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
