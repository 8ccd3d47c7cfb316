//! Change notifications for front ends.
//!
//! The session store publishes here whenever the session state changes, so a
//! UI can re-render without polling.
//!
//! # Example
//!
//! ```rust
//! use fishon_core::event_bus::{EventBus, SESSION_CHANGED};
//! use std::sync::Arc;
//!
//! let events = Arc::new(EventBus::new());
//! let mut rx = events.subscribe();
//!
//! events.emit(SESSION_CHANGED, &serde_json::json!({"status": "anonymous"}));
//!
//! let event = rx.try_recv().unwrap();
//! assert_eq!(event.event_type, SESSION_CHANGED);
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Emitted with the new `SessionState` as payload.
pub const SESSION_CHANGED: &str = "session:changed";

/// Events beyond this many unread will make slow subscribers lag.
const DEFAULT_CAPACITY: usize = 64;

/// An event type plus its JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub event_type: String,
    pub payload: serde_json::Value,
}

impl BroadcastEvent {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// Publish-subscribe channel shared by everything in a `FishOnContext`.
pub struct EventBus {
    sender: broadcast::Sender<BroadcastEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns how many subscribers received it; with none the event is
    /// dropped and 0 is returned.
    pub fn emit<T: Serialize>(&self, event_type: &str, payload: &T) -> usize {
        let json_payload = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Failed to serialize {} payload: {}", event_type, e);
                return 0;
            }
        };

        self.sender
            .send(BroadcastEvent::new(event_type, json_payload))
            .unwrap_or(0)
    }

    /// Receive all future events. Past events are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
