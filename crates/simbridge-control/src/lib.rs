//! `simbridge-control` – HTTP control surface of the simulator bridge.
//!
//! Boots an axum server (default port `5000`) whose endpoints either turn a
//! request into a [`Command`] broadcast to connected simulators, or read the
//! latest telemetry:
//!
//! | Endpoint | Effect |
//! |---|---|
//! | `POST /move {x,z}` | `move` to a ground position |
//! | `POST /move_rel {turn,distance}` | `move_relative` |
//! | `POST /stop` | `stop` |
//! | `POST /capture` | `capture_image` |
//! | `POST /goal {corner}` or `{x,z[,y]}` | `set_goal` |
//! | `POST /obstacles/positions {positions}` | `set_obstacles` |
//! | `POST /obstacles/motion {enabled,...}` | `set_obstacle_motion` |
//! | `POST /reset` | zero collisions, `reset` |
//! | `GET /collisions` | `{count}` |
//! | `GET /latest_capture[?meta=1]` | latest capture or `{available:false}` |
//! | `GET /latest_event` | latest event or `{available:false}` |
//!
//! Validation failures answer `400`; a broadcast with no simulator connected
//! answers `409`.  Both carry an `error` string.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::net::SocketAddr;
//! use simbridge_control::ControlServer;
//! use simbridge_middleware::Relay;
//!
//! #[tokio::main]
//! async fn main() {
//!     let relay = Relay::new();
//!     ControlServer::bind(SocketAddr::from(([127, 0, 0, 1], 5000)), &relay)
//!         .await
//!         .expect("bind failed")
//!         .run()
//!         .await
//!         .expect("control server failed");
//! }
//! ```
//!
//! [`Command`]: simbridge_types::Command

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{router, ControlServer, DEFAULT_HTTP_PORT};
