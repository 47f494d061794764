//! Geolocation capability trait.
//!
//! Abstracts the platform geolocation API so acquisition logic stays
//! platform-free and testable.

use crate::state::{LocationError, LocationSnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Answer to a location permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Platform geolocation capability.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Whether this platform can produce a location at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Ask the user for foreground location permission.
    async fn request_permission(&self) -> PermissionStatus;

    /// Read the current device position.
    async fn current_position(&self) -> Result<LocationSnapshot, LocationError>;
}

/// Provider for platforms without a geolocation capability (the web build).
///
/// Acquisition never calls into it; the methods exist only to satisfy the
/// trait and answer as if the capability were refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebProvider;

impl WebProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GeolocationProvider for WebProvider {
    fn is_available(&self) -> bool {
        false
    }

    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Denied
    }

    async fn current_position(&self) -> Result<LocationSnapshot, LocationError> {
        Err(LocationError::AcquisitionUnavailable(
            "geolocation is not supported on this platform".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_web_provider_is_unavailable() {
        let provider = WebProvider::new();
        assert!(!provider.is_available());
        assert_eq!(provider.request_permission().await, PermissionStatus::Denied);
        assert!(provider.current_position().await.is_err());
    }
}
