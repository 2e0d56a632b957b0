//! [`CommandBroadcaster`] – fan a [`Command`] out to every live simulator.
//!
//! Delivery is fire-and-forget: each connection gets the frame queued on its
//! own outbound channel, and a failure on one connection only schedules that
//! connection for removal.  The caller learns whether there was anyone to
//! send to, nothing more.

use std::sync::Arc;

use simbridge_types::{BridgeError, Command};
use tracing::{debug, info, warn};

use crate::registry::ConnectionRegistry;

#[derive(Debug, Clone)]
pub struct CommandBroadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl CommandBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Send `command` to every connection live at dispatch time.
    ///
    /// Returns `Ok(true)` when at least one connection was targeted and
    /// `Ok(false)` when the registry was empty.  Individual delivery
    /// failures are logged and never surface here.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Serialization`] if the command cannot be
    /// encoded.
    pub fn broadcast(&self, command: &Command) -> Result<bool, BridgeError> {
        let targets = self.registry.snapshot();
        if targets.is_empty() {
            debug!(command = command.kind(), "broadcast skipped: no simulator connected");
            return Ok(false);
        }

        let frame = command.to_wire()?;
        let mut failed = Vec::new();

        for handle in &targets {
            if let Err(e) = handle.send(frame.clone()) {
                warn!(connection = %handle.id(), error = %e, "delivery failed; dropping connection");
                failed.push(handle.id());
            }
        }

        for id in &failed {
            self.registry.remove(*id);
        }

        info!(
            command = command.kind(),
            targets = targets.len(),
            failed = failed.len(),
            "command broadcast"
        );
        Ok(true)
    }
}
