//! Device-backed geolocation provider.

use crate::provider::{GeolocationProvider, PermissionStatus};
use crate::state::{LocationError, LocationSnapshot};
use async_trait::async_trait;
use tokio::sync::watch;

/// Native provider fed by the host platform bridge.
///
/// The bridge answers the permission prompt with [`set_permission`] and
/// forwards position callbacks with [`push_fix`] / [`push_failure`]. Reads
/// wait until the bridge has something to say.
///
/// [`set_permission`]: NativeProvider::set_permission
/// [`push_fix`]: NativeProvider::push_fix
/// [`push_failure`]: NativeProvider::push_failure
#[derive(Debug)]
pub struct NativeProvider {
    permission: watch::Sender<Option<PermissionStatus>>,
    position: watch::Sender<Option<Result<LocationSnapshot, LocationError>>>,
}

impl Default for NativeProvider {
    fn default() -> Self {
        Self {
            permission: watch::Sender::new(None),
            position: watch::Sender::new(None),
        }
    }
}

impl NativeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider whose permission prompt is already answered.
    pub fn with_permission(status: PermissionStatus) -> Self {
        let provider = Self::new();
        provider.set_permission(status);
        provider
    }

    /// Record the user's answer to the permission prompt.
    pub fn set_permission(&self, status: PermissionStatus) {
        tracing::debug!(?status, "location permission answered");
        self.permission.send_replace(Some(status));
    }

    /// Record a position update from the device.
    pub fn push_fix(&self, fix: LocationSnapshot) {
        self.position.send_replace(Some(Ok(fix)));
    }

    /// Record a hardware failure from the device.
    pub fn push_failure(&self, error: LocationError) {
        tracing::debug!(%error, "location hardware failure");
        self.position.send_replace(Some(Err(error)));
    }
}

#[async_trait]
impl GeolocationProvider for NativeProvider {
    async fn request_permission(&self) -> PermissionStatus {
        let mut rx = self.permission.subscribe();
        let status = match rx.wait_for(Option::is_some).await {
            Ok(status) => (*status).unwrap_or(PermissionStatus::Denied),
            // Sender lives in self, so the channel can't close while we wait.
            Err(_) => PermissionStatus::Denied,
        };
        status
    }

    async fn current_position(&self) -> Result<LocationSnapshot, LocationError> {
        let mut rx = self.position.subscribe();
        let reading = rx.wait_for(Option::is_some).await.map_err(|_| {
            LocationError::AcquisitionUnavailable("position source closed".to_string())
        })?;
        reading.clone().unwrap_or_else(|| {
            Err(LocationError::AcquisitionUnavailable(
                "no position reported".to_string(),
            ))
        })
    }
}
