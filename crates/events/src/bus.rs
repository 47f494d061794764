//! Event bus abstraction for decoupled event emission.
//!
//! Core components publish what happened (a location resolved, a match became
//! visible) without knowing who renders it. Hosts plug in their own bus; tests
//! use [`InMemoryEventBus`] to assert on what was emitted.

use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard};

/// Trait for emitting events to subscribers.
pub trait EventBus: Send + Sync {
    /// Emit an event with a JSON payload.
    ///
    /// # Arguments
    /// * `topic` - Event name/topic (e.g., "match:pending")
    /// * `payload` - JSON payload to emit
    fn emit(&self, topic: &str, payload: serde_json::Value);
}

/// Type alias for shared event bus reference.
pub type EventBusRef = Arc<dyn EventBus>;

/// Serialize `payload` and emit it, logging instead of failing on bad payloads.
pub fn emit_serialized<T: serde::Serialize>(bus: &dyn EventBus, topic: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => bus.emit(topic, value),
        Err(e) => tracing::warn!(topic, error = %e, "failed to serialize event payload"),
    }
}

/// In-memory event bus for testing.
///
/// Captures all emitted events for later inspection.
#[derive(Default)]
pub struct InMemoryEventBus {
    events: Mutex<Vec<EmittedEvent>>,
}

/// A captured event from InMemoryEventBus.
#[derive(Debug, Clone)]
pub struct EmittedEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<EmittedEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get all captured events.
    pub fn events(&self) -> Vec<EmittedEvent> {
        self.guard().clone()
    }

    /// Get events for a specific topic.
    pub fn events_for(&self, topic: &str) -> Vec<EmittedEvent> {
        self.guard()
            .iter()
            .filter(|e| e.topic == topic)
            .cloned()
            .collect()
    }

    /// Decode every payload captured under `topic`, skipping ones that don't fit `T`.
    pub fn payloads_for<T: DeserializeOwned>(&self, topic: &str) -> Vec<T> {
        self.guard()
            .iter()
            .filter(|e| e.topic == topic)
            .filter_map(|e| serde_json::from_value(e.payload.clone()).ok())
            .collect()
    }

    pub fn clear(&self) {
        self.guard().clear();
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}

impl EventBus for InMemoryEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        self.guard().push(EmittedEvent {
            topic: topic.to_string(),
            payload,
        });
    }
}

/// Bus that forwards every event to the tracing subscriber at debug level.
///
/// Handy for headless runs where nothing renders the events.
pub struct TracingEventBus;

impl EventBus for TracingEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        tracing::debug!(topic, %payload, "event");
    }
}

/// No-op event bus that discards all events.
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn emit(&self, _topic: &str, _payload: serde_json::Value) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_in_memory_event_bus() {
        let bus = InMemoryEventBus::new();

        bus.emit("match:pending", json!({"user_id": "u1"}));
        bus.emit("location:changed", json!({"is_acquiring": true}));
        bus.emit("match:pending", json!({"user_id": "u2"}));

        assert_eq!(bus.len(), 3);
        assert_eq!(bus.events_for("match:pending").len(), 2);
        assert_eq!(bus.events_for("location:changed").len(), 1);
        assert_eq!(bus.events_for("missing").len(), 0);
    }

    #[test]
    fn test_payloads_for_skips_mismatched_shapes() {
        #[derive(serde::Deserialize)]
        struct UserOnly {
            user_id: String,
        }

        let bus = InMemoryEventBus::new();
        bus.emit("match:pending", json!({"user_id": "u1"}));
        bus.emit("match:pending", json!({"unexpected": 1}));

        let decoded: Vec<UserOnly> = bus.payloads_for("match:pending");
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].user_id, "u1");
    }

    #[test]
    fn test_emit_serialized() {
        let bus = InMemoryEventBus::new();
        emit_serialized(&bus, "signals:changed", &vec!["a", "b"]);
        assert_eq!(bus.events()[0].payload, json!(["a", "b"]));
    }

    #[test]
    fn test_clear() {
        let bus = InMemoryEventBus::new();
        bus.emit("test:event", json!({}));
        assert!(!bus.is_empty());

        bus.clear();
        assert!(bus.is_empty());
    }

    #[test]
    fn test_null_and_tracing_buses_accept_events() {
        NullEventBus.emit("test:event", json!({"data": "ignored"}));
        TracingEventBus.emit("test:event", json!({"data": "logged"}));
    }
}
