//! Location state published to consumers.

use serde::{Deserialize, Serialize};

/// A single latitude/longitude fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationSnapshot {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Why an acquisition attempt ended without a location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    AcquisitionUnavailable(String),

    #[error("timeout")]
    AcquisitionTimeout,
}

/// Where an acquisition currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionPhase {
    /// Created but `start()` has not been called.
    Idle,
    Acquiring,
    /// Terminal. `None` means no location exists for this session (web fallback).
    Resolved(Option<LocationSnapshot>),
    /// Terminal, non-fatal.
    Failed(String),
}

impl AcquisitionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved(_) | Self::Failed(_))
    }
}

/// Snapshot of acquisition progress as seen by readers.
///
/// Only constructible through the associated functions, so `is_acquiring`
/// never coexists with a location or an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationState {
    location: Option<LocationSnapshot>,
    error_msg: Option<String>,
    is_acquiring: bool,
}

impl LocationState {
    /// Location not known yet.
    pub fn acquiring() -> Self {
        Self {
            location: None,
            error_msg: None,
            is_acquiring: true,
        }
    }

    pub fn resolved(location: Option<LocationSnapshot>) -> Self {
        Self {
            location,
            error_msg: None,
            is_acquiring: false,
        }
    }

    /// Permanently no location and no error: the capability does not exist.
    pub fn unavailable() -> Self {
        Self::resolved(None)
    }

    pub fn failed(error_msg: impl Into<String>) -> Self {
        Self {
            location: None,
            error_msg: Some(error_msg.into()),
            is_acquiring: false,
        }
    }

    pub fn location(&self) -> Option<&LocationSnapshot> {
        self.location.as_ref()
    }

    pub fn error_msg(&self) -> Option<&str> {
        self.error_msg.as_deref()
    }

    pub fn is_acquiring(&self) -> bool {
        self.is_acquiring
    }

    /// True once acquisition has settled, with or without a location.
    pub fn is_settled(&self) -> bool {
        !self.is_acquiring
    }

    pub fn to_event(&self) -> kindred_events::LocationChangedEvent {
        kindred_events::LocationChangedEvent {
            latitude: self.location.map(|l| l.latitude),
            longitude: self.location.map(|l| l.longitude),
            error_msg: self.error_msg.clone(),
            is_acquiring: self.is_acquiring,
        }
    }
}

impl Default for LocationState {
    fn default() -> Self {
        Self::acquiring()
    }
}

impl From<&AcquisitionPhase> for LocationState {
    fn from(phase: &AcquisitionPhase) -> Self {
        match phase {
            // Not started is still "not yet known" to readers.
            AcquisitionPhase::Idle | AcquisitionPhase::Acquiring => Self::acquiring(),
            AcquisitionPhase::Resolved(location) => Self::resolved(*location),
            AcquisitionPhase::Failed(msg) => Self::failed(msg.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquiring_carries_nothing() {
        let state = LocationState::acquiring();
        assert!(state.is_acquiring());
        assert!(state.location().is_none());
        assert!(state.error_msg().is_none());
    }

    #[test]
    fn test_phase_conversion() {
        let fix = LocationSnapshot::new(37.7, -122.4);

        let state = LocationState::from(&AcquisitionPhase::Resolved(Some(fix)));
        assert_eq!(state.location(), Some(&fix));
        assert!(!state.is_acquiring());
        assert!(state.error_msg().is_none());

        let state = LocationState::from(&AcquisitionPhase::Failed("timeout".into()));
        assert_eq!(state.error_msg(), Some("timeout"));
        assert!(state.location().is_none());

        assert!(LocationState::from(&AcquisitionPhase::Idle).is_acquiring());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(LocationError::PermissionDenied.to_string(), "Permission denied");
        assert_eq!(LocationError::AcquisitionTimeout.to_string(), "timeout");
        assert_eq!(
            LocationError::AcquisitionUnavailable("gps off".into()).to_string(),
            "Location unavailable: gps off"
        );
    }

    #[test]
    fn test_to_event() {
        let event = LocationState::resolved(Some(LocationSnapshot::new(1.0, 2.0))).to_event();
        assert_eq!(event.latitude, Some(1.0));
        assert_eq!(event.longitude, Some(2.0));
        assert!(!event.is_acquiring);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(!AcquisitionPhase::Idle.is_terminal());
        assert!(!AcquisitionPhase::Acquiring.is_terminal());
        assert!(AcquisitionPhase::Resolved(None).is_terminal());
        assert!(AcquisitionPhase::Failed("x".into()).is_terminal());
    }
}
