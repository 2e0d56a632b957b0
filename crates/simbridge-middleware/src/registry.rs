//! [`ConnectionRegistry`] – the set of live simulator sockets.
//!
//! A connection is represented by a [`SimulatorHandle`]: an id plus the
//! sending half of an unbounded channel drained by that connection's writer
//! task.  Pushing a frame into the channel never blocks on network I/O, so
//! the broadcaster can fan out while the registry lock is not held.
//!
//! Every accepted socket registers itself through [`ConnectionRegistry::register`]
//! and keeps the returned [`Registration`] alive for the lifetime of its
//! receive loop.  Dropping the registration removes the connection, which
//! covers normal close, protocol errors and panics alike.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use simbridge_types::BridgeError;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Opaque identifier of one simulator connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to one live simulator connection.
///
/// Cloning is cheap; all clones feed the same outbound queue.
#[derive(Debug, Clone)]
pub struct SimulatorHandle {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    outbox: mpsc::UnboundedSender<String>,
}

impl SimulatorHandle {
    /// Create a handle and the receiver its writer task should drain.
    pub fn new(peer: Option<SocketAddr>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (outbox, rx) = mpsc::unbounded_channel();
        let handle = Self {
            id: ConnectionId::new(),
            peer,
            outbox,
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Queue a text frame for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] when the connection's writer has
    /// already shut down.
    pub fn send(&self, frame: String) -> Result<(), BridgeError> {
        self.outbox
            .send(frame)
            .map_err(|_| BridgeError::Transport(format!("connection {} is closed", self.id)))
    }
}

/// Concurrency-safe set of live simulator connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, SimulatorHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, handle: SimulatorHandle) {
        self.connections.lock().insert(handle.id(), handle);
    }

    /// Remove a connection.  Returns `false` if it was already gone.
    pub fn remove(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(&id).is_some()
    }

    /// Point-in-time copy of every live connection, in no particular order.
    pub fn snapshot(&self) -> Vec<SimulatorHandle> {
        self.connections.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }

    /// Add `handle` and return a guard that removes it again on drop.
    pub fn register(self: &Arc<Self>, handle: SimulatorHandle) -> Registration {
        let id = handle.id();
        self.add(handle);
        Registration {
            registry: Arc::clone(self),
            id,
        }
    }
}

/// Scoped membership in a [`ConnectionRegistry`].
pub struct Registration {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl Registration {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.registry.remove(self.id) {
            debug!(connection = %self.id, "connection unregistered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_snapshot_remove() {
        let registry = ConnectionRegistry::new();
        let (a, _rx_a) = SimulatorHandle::new(None);
        let (b, _rx_b) = SimulatorHandle::new(None);
        let a_id = a.id();

        registry.add(a);
        registry.add(b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.snapshot().len(), 2);

        assert!(registry.remove(a_id));
        assert!(!registry.remove(a_id), "second removal is a no-op");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn snapshot_is_detached_from_later_changes() {
        let registry = ConnectionRegistry::new();
        let (a, _rx_a) = SimulatorHandle::new(None);
        registry.add(a);

        let snap = registry.snapshot();
        let (b, _rx_b) = SimulatorHandle::new(None);
        registry.add(b);

        assert_eq!(snap.len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registration_drop_unregisters() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (handle, _rx) = SimulatorHandle::new(None);
        {
            let reg = registry.register(handle.clone());
            assert_eq!(reg.id(), handle.id());
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn registration_drop_after_manual_removal_is_harmless() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (handle, _rx) = SimulatorHandle::new(None);
        let reg = registry.register(handle.clone());
        registry.remove(handle.id());
        drop(reg);
        assert!(registry.is_empty());
    }

    #[test]
    fn send_fails_once_writer_is_gone() {
        let (handle, rx) = SimulatorHandle::new(None);
        assert!(handle.send("{}".to_string()).is_ok());
        drop(rx);
        assert!(matches!(handle.send("{}".to_string()), Err(BridgeError::Transport(_))));
    }

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }
}
