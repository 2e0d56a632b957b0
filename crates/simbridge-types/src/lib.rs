//! `simbridge-types` – shared vocabulary of the simulator bridge.
//!
//! Every other crate in the workspace speaks in these types:
//!
//! - [`command`] – [`Command`], the closed set of messages the bridge sends
//!   to a simulator, plus the [`Position`] / [`ObstacleMotion`] payloads.
//! - [`telemetry`] – [`TelemetryMessage`], the classified form of what a
//!   simulator sends back, and the [`Capture`] / [`LatestEvent`] records the
//!   bridge retains.
//! - [`corner`] – compass-corner names resolved to floor coordinates.
//! - [`BridgeError`] – the error type shared by the bridge crates.

pub mod command;
pub mod corner;
pub mod telemetry;

pub use command::{Command, ObstacleBounds, ObstacleMotion, Position};
pub use corner::{corner_to_position, DEFAULT_CORNER_MARGIN, FLOOR_HALF_EXTENT};
pub use telemetry::{Capture, LatestEvent, TelemetryMessage};

use thiserror::Error;

/// Errors raised anywhere between an HTTP request and a simulator socket.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// A request field was missing or had the wrong shape.
    #[error("{0}")]
    Validation(String),

    /// A command had nowhere to go because no simulator is connected.
    #[error("No connected simulators.")]
    NoSimulator,

    #[error("Serialization Error: {0}")]
    Serialization(String),

    /// Network failure while talking to a simulator.
    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Bind Error on {addr}: {details}")]
    Bind { addr: String, details: String },
}
