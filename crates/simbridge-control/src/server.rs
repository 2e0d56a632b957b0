//! [`ControlServer`] – the HTTP JSON surface of the bridge.
//!
//! Listens on `127.0.0.1:5000` by default.  Cross-origin requests are
//! allowed from anywhere so browser control pages can call it directly.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use simbridge_middleware::Relay;
use simbridge_types::BridgeError;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::handlers::{self, AppState};

/// Default TCP port for the control API.
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Build the control router over `relay`.
pub fn router(relay: &Relay) -> Router {
    let state = AppState {
        broadcaster: relay.broadcaster(),
        store: Arc::clone(relay.store()),
    };

    Router::new()
        .route("/move", post(handlers::move_to))
        .route("/move_rel", post(handlers::move_relative))
        .route("/stop", post(handlers::stop))
        .route("/capture", post(handlers::capture))
        .route("/goal", post(handlers::set_goal))
        .route("/obstacles/positions", post(handlers::set_obstacle_positions))
        .route("/obstacles/motion", post(handlers::set_obstacle_motion))
        .route("/collisions", get(handlers::collisions))
        .route("/reset", post(handlers::reset))
        .route("/latest_capture", get(handlers::latest_capture))
        .route("/latest_event", get(handlers::latest_event))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub struct ControlServer {
    listener: TcpListener,
    router: Router,
}

impl ControlServer {
    /// Bind the listener.  Use port `0` to let the OS pick one.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Bind`] if the address is unavailable.
    pub async fn bind(addr: SocketAddr, relay: &Relay) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind(addr).await.map_err(|e| BridgeError::Bind {
            addr: addr.to_string(),
            details: e.to_string(),
        })?;
        Ok(Self {
            listener,
            router: router(relay),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BridgeError> {
        self.listener
            .local_addr()
            .map_err(|e| BridgeError::Transport(e.to_string()))
    }

    /// Serve requests until the task is cancelled.
    pub async fn run(self) -> Result<(), BridgeError> {
        if let Ok(addr) = self.listener.local_addr() {
            info!("control API listening on http://{addr}");
        }
        axum::serve(self.listener, self.router)
            .await
            .map_err(|e| BridgeError::Transport(format!("control server exited: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_on_ephemeral_port() {
        let relay = Relay::new();
        let server = ControlServer::bind(SocketAddr::from(([127, 0, 0, 1], 0)), &relay)
            .await
            .unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let relay = Relay::new();
        let first = ControlServer::bind(SocketAddr::from(([127, 0, 0, 1], 0)), &relay)
            .await
            .unwrap();
        let addr = first.local_addr().unwrap();
        let err = ControlServer::bind(addr, &relay).await.err().unwrap();
        assert!(matches!(err, BridgeError::Bind { .. }));
    }
}
