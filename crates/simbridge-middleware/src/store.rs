//! [`TelemetryStore`] – latest capture, latest event and the collision
//! counter, behind one lock.
//!
//! Writes are last-write-wins by completion order.  The lock is only held
//! for the copy or the assignment; callers get owned snapshots back.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use simbridge_types::{Capture, LatestEvent};

#[derive(Debug, Default)]
struct TelemetryState {
    capture: Option<Arc<Capture>>,
    event: Option<LatestEvent>,
    collisions: u64,
}

#[derive(Debug, Default)]
pub struct TelemetryStore {
    state: Mutex<TelemetryState>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the latest capture and record a matching `capture_ack` event
    /// in a single critical section.
    pub fn record_capture(&self, capture: Capture) {
        let ack = LatestEvent::CaptureAck {
            timestamp: capture.timestamp.clone(),
        };
        let mut state = self.state.lock();
        state.capture = Some(Arc::new(capture));
        state.event = Some(ack);
    }

    /// Count a collision and keep its message as the latest event.
    ///
    /// Returns the counter value after the increment.
    pub fn record_collision(&self, message: Map<String, Value>) -> u64 {
        let mut state = self.state.lock();
        state.collisions = state.collisions.saturating_add(1);
        state.event = Some(LatestEvent::Collision(message));
        state.collisions
    }

    pub fn record_event(&self, event: LatestEvent) {
        self.state.lock().event = Some(event);
    }

    pub fn collision_count(&self) -> u64 {
        self.state.lock().collisions
    }

    /// Zero the collision counter.  The only way it ever goes down.
    pub fn reset_collisions(&self) {
        self.state.lock().collisions = 0;
    }

    pub fn latest_capture(&self) -> Option<Arc<Capture>> {
        self.state.lock().capture.clone()
    }

    pub fn latest_event(&self) -> Option<LatestEvent> {
        self.state.lock().event.clone()
    }
}
