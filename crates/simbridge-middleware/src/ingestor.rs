//! [`TelemetryIngestor`] – per-connection receive loop.
//!
//! Each inbound frame is decoded into a [`TelemetryMessage`] and folded into
//! the shared [`TelemetryStore`].  Malformed frames are dropped; unknown
//! message types are accepted and ignored.  The loop ends when the socket
//! closes or errors.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use simbridge_types::{LatestEvent, TelemetryMessage};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, trace, warn};

use crate::registry::ConnectionId;
use crate::store::TelemetryStore;

/// What a single frame did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingested {
    Capture,
    /// Counter value after the increment.
    Collision(u64),
    /// A `collision` frame whose flag was falsy.
    CollisionIgnored,
    /// `goal_reached` or `confirmation`.
    Event(&'static str),
    /// Valid JSON object with an unrecognised or missing `type`.
    Ignored,
    /// Not a JSON object.
    Malformed,
}

pub struct TelemetryIngestor {
    connection: ConnectionId,
    store: Arc<TelemetryStore>,
}

impl TelemetryIngestor {
    pub fn new(connection: ConnectionId, store: Arc<TelemetryStore>) -> Self {
        Self { connection, store }
    }

    /// Classify one text frame and apply it to the store.
    pub fn ingest(&self, text: &str) -> Ingested {
        let message = match TelemetryMessage::decode(text) {
            Ok(m) => m,
            Err(e) => {
                debug!(connection = %self.connection, error = %e, "discarding malformed telemetry");
                return Ingested::Malformed;
            }
        };

        match message {
            TelemetryMessage::CaptureImageResponse(capture) => {
                self.store.record_capture(capture);
                Ingested::Capture
            }
            TelemetryMessage::Collision { collision: true, message } => {
                let count = self.store.record_collision(message);
                info!(connection = %self.connection, count, "collision reported");
                Ingested::Collision(count)
            }
            TelemetryMessage::Collision { collision: false, .. } => Ingested::CollisionIgnored,
            TelemetryMessage::GoalReached(m) => {
                self.store.record_event(LatestEvent::GoalReached(m));
                Ingested::Event("goal_reached")
            }
            TelemetryMessage::Confirmation(m) => {
                self.store.record_event(LatestEvent::Confirmation(m));
                Ingested::Event("confirmation")
            }
            TelemetryMessage::Other { kind } => {
                trace!(connection = %self.connection, kind = ?kind, "ignoring telemetry");
                Ingested::Ignored
            }
        }
    }

    /// Drain `frames` until the connection closes or errors.
    pub async fn run<S>(self, mut frames: S)
    where
        S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        while let Some(frame) = frames.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    self.ingest(text.as_str());
                }
                Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                    Ok(text) => {
                        self.ingest(text);
                    }
                    Err(_) => {
                        debug!(connection = %self.connection, "discarding non-utf8 binary frame");
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(connection = %self.connection, error = %e, "simulator read error");
                    break;
                }
            }
        }
    }
}
