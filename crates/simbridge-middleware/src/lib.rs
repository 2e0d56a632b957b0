//! `simbridge-middleware` – the relay between HTTP callers and simulators.
//!
//! Routes commands out and telemetry in without caring what a capture looks
//! like or why a command was issued.
//!
//! # Modules
//!
//! - [`registry`] – [`ConnectionRegistry`]: the live simulator sockets, with
//!   scoped [`Registration`]s that unregister on drop.
//! - [`broadcaster`] – [`CommandBroadcaster`]: best-effort fan-out of a
//!   [`Command`][simbridge_types::Command] to every registered socket.
//! - [`store`] – [`TelemetryStore`]: latest capture, latest event and the
//!   collision counter.
//! - [`ingestor`] – [`TelemetryIngestor`]: per-socket receive loop feeding
//!   the store.
//! - [`sim_server`] – [`SimulatorServer`]: the WebSocket listener that ties
//!   the above together for each accepted simulator.

pub mod broadcaster;
pub mod ingestor;
pub mod registry;
pub mod relay;
pub mod sim_server;
pub mod store;

pub use broadcaster::CommandBroadcaster;
pub use ingestor::{Ingested, TelemetryIngestor};
pub use registry::{ConnectionId, ConnectionRegistry, Registration, SimulatorHandle};
pub use relay::Relay;
pub use sim_server::{SimulatorServer, DEFAULT_SIMULATOR_PORT};
pub use store::TelemetryStore;
