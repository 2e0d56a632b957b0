//! [`SimulatorServer`] – WebSocket endpoint simulators connect to.
//!
//! Each accepted socket gets:
//!
//! 1. a [`SimulatorHandle`] registered for the life of the connection,
//! 2. a writer task draining the handle's outbound queue into the socket,
//! 3. a [`TelemetryIngestor`] reading frames until close or error.
//!
//! Whichever of the writer or the reader finishes first ends the session,
//! and the registration is dropped on every exit path.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use simbridge_types::BridgeError;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};

use crate::ingestor::TelemetryIngestor;
use crate::registry::{ConnectionRegistry, SimulatorHandle};
use crate::relay::Relay;
use crate::store::TelemetryStore;

/// Default TCP port simulators connect to.
pub const DEFAULT_SIMULATOR_PORT: u16 = 8080;

pub struct SimulatorServer {
    listener: TcpListener,
    relay: Relay,
}

impl SimulatorServer {
    /// Bind the listener.  Use port `0` to let the OS pick one.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Bind`] if the address is unavailable.
    pub async fn bind(addr: SocketAddr, relay: Relay) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind(addr).await.map_err(|e| BridgeError::Bind {
            addr: addr.to_string(),
            details: e.to_string(),
        })?;
        Ok(Self { listener, relay })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BridgeError> {
        self.listener
            .local_addr()
            .map_err(|e| BridgeError::Transport(e.to_string()))
    }

    /// Accept simulators until the task is cancelled.
    pub async fn run(self) -> Result<(), BridgeError> {
        if let Ok(addr) = self.listener.local_addr() {
            info!("simulator WebSocket listening on ws://{addr}");
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let registry = Arc::clone(self.relay.registry());
                    let store = Arc::clone(self.relay.store());
                    tokio::spawn(async move {
                        if let Err(e) = handle_simulator(stream, peer, registry, store).await {
                            error!(peer = %peer, error = %e, "simulator session error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "simulator accept error");
                }
            }
        }
    }
}

async fn handle_simulator(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    store: Arc<TelemetryStore>,
) -> Result<(), BridgeError> {
    let ws_stream = accept_async(stream).await.map_err(|e| {
        BridgeError::Transport(format!("ws handshake from {peer}: {e}"))
    })?;
    let (mut ws_tx, ws_rx) = ws_stream.split();

    let (handle, mut outbox) = SimulatorHandle::new(Some(peer));
    let registration = registry.register(handle);
    let id = registration.id();
    info!(peer = %peer, connection = %id, "simulator connected");

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbox.recv().await {
            if let Err(e) = ws_tx.send(Message::Text(frame.into())).await {
                warn!(connection = %id, error = %e, "simulator write error");
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let reader = TelemetryIngestor::new(id, store).run(ws_rx);

    tokio::select! {
        _ = reader => {}
        _ = &mut writer => {}
    }
    writer.abort();
    drop(registration);

    info!(peer = %peer, connection = %id, "simulator disconnected");
    Ok(())
}
