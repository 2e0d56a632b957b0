//! [`Relay`] – the shared state every bridge component hangs off.

use std::sync::Arc;

use crate::broadcaster::CommandBroadcaster;
use crate::registry::ConnectionRegistry;
use crate::store::TelemetryStore;

/// Owns the two pieces of mutable shared state: the live connections and
/// the telemetry store.  Created once at startup and cloned into every
/// server task.
#[derive(Debug, Clone, Default)]
pub struct Relay {
    registry: Arc<ConnectionRegistry>,
    store: Arc<TelemetryStore>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<TelemetryStore> {
        &self.store
    }

    pub fn broadcaster(&self) -> CommandBroadcaster {
        CommandBroadcaster::new(Arc::clone(&self.registry))
    }
}
