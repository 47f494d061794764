//! Shared event contracts for the kindred core.
//!
//! This crate defines the DTOs for events that flow from the core components
//! to whatever UI layer hosts them. Using shared types keeps producer and
//! consumer field names in lockstep.
//!
//! Also provides the `EventBus` trait for decoupled event emission.

mod bus;

pub use bus::{
    emit_serialized, EmittedEvent, EventBus, EventBusRef, InMemoryEventBus, NullEventBus,
    TracingEventBus,
};

use serde::{Deserialize, Serialize};

/// Event emitted whenever the published location state changes.
///
/// Producers: location acquisition
/// Consumers: feed screens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationChangedEvent {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub error_msg: Option<String>,
    pub is_acquiring: bool,
}

/// Event emitted when a match becomes the visible pending notification.
///
/// Producers: match deduper
/// Consumers: match modal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPendingEvent {
    /// The other user's id.
    pub user_id: String,
    pub match_id: String,
    /// Matches still waiting behind this one.
    #[serde(default)]
    pub queued: usize,
}

/// Event emitted when the user dismisses a match notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchAcknowledgedEvent {
    pub user_id: String,
}

/// Event emitted when a UI signal field changes.
///
/// Producers: signal store
/// Consumers: screens that don't hold a watch receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalChangedEvent {
    /// Name of the field that changed (e.g. "active_tab").
    pub field: String,
}

/// Event names as constants to prevent typos.
pub mod event_names {
    pub const LOCATION_CHANGED: &str = "location:changed";
    pub const MATCH_PENDING: &str = "match:pending";
    pub const MATCH_ACKNOWLEDGED: &str = "match:acknowledged";
    pub const SIGNAL_CHANGED: &str = "signals:changed";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_changed_deserialize_minimal() {
        let json = r#"{"is_acquiring": true}"#;
        let event: LocationChangedEvent = serde_json::from_str(json).unwrap();
        assert!(event.is_acquiring);
        assert_eq!(event.latitude, None);
        assert_eq!(event.error_msg, None);
    }

    #[test]
    fn test_match_pending_defaults_queued() {
        let json = r#"{"user_id": "u1", "match_id": "m1"}"#;
        let event: MatchPendingEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.user_id, "u1");
        assert_eq!(event.queued, 0);
    }
}
