//! Location acquisition lifecycle.
//!
//! Owns the only writable copy of [`LocationState`]. Readers subscribe to a
//! watch channel and never write back.

use crate::provider::{GeolocationProvider, PermissionStatus};
use crate::state::{AcquisitionPhase, LocationError, LocationSnapshot, LocationState};
use kindred_events::{event_names, EventBusRef};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Default upper bound on a single acquisition attempt.
pub const DEFAULT_ACQUISITION_TIMEOUT: Duration = Duration::from_secs(12);

#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    /// How long to wait for permission plus a fix before giving up.
    pub timeout: Duration,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_ACQUISITION_TIMEOUT,
        }
    }
}

struct Machine {
    phase: AcquisitionPhase,
    torn_down: bool,
    cancel: Option<CancellationToken>,
}

struct Shared {
    machine: Mutex<Machine>,
    tx: watch::Sender<LocationState>,
    bus: Option<EventBusRef>,
    /// Cancelled once by `stop()`. Wakes `settled()` waiters.
    teardown: CancellationToken,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Machine> {
        self.machine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publish the state derived from `machine.phase`. Caller holds the lock.
    fn publish(&self, machine: &Machine) {
        let next = LocationState::from(&machine.phase);
        let changed = self.tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next.clone();
            true
        });

        if changed {
            if let Some(bus) = &self.bus {
                kindred_events::emit_serialized(
                    bus.as_ref(),
                    event_names::LOCATION_CHANGED,
                    &next.to_event(),
                );
            }
        }
    }

    /// Settle an attempt, unless it was cancelled or the owner is gone.
    fn finish(&self, token: &CancellationToken, phase: AcquisitionPhase) {
        let mut machine = self.lock();
        if token.is_cancelled() || machine.torn_down {
            tracing::debug!(?phase, "dropping location result after teardown");
            return;
        }

        match &phase {
            AcquisitionPhase::Resolved(location) => {
                tracing::info!(?location, "location acquired")
            }
            AcquisitionPhase::Failed(msg) => {
                tracing::info!(error = %msg, "location acquisition failed")
            }
            _ => {}
        }

        machine.phase = phase;
        machine.cancel = None;
        self.publish(&machine);
    }
}

/// Obtains the device location once and publishes the result.
///
/// `Idle → Acquiring → Resolved | Failed`. On a platform without geolocation
/// the acquisition is born `Resolved(None)` and never changes.
pub struct LocationAcquisition {
    shared: Arc<Shared>,
    provider: Arc<dyn GeolocationProvider>,
    config: AcquisitionConfig,
}

impl LocationAcquisition {
    pub fn new(provider: Arc<dyn GeolocationProvider>, config: AcquisitionConfig) -> Self {
        Self::build(provider, config, None)
    }

    /// Like [`new`](Self::new), also emitting `location:changed` on `bus`.
    pub fn with_event_bus(
        provider: Arc<dyn GeolocationProvider>,
        config: AcquisitionConfig,
        bus: EventBusRef,
    ) -> Self {
        Self::build(provider, config, Some(bus))
    }

    fn build(
        provider: Arc<dyn GeolocationProvider>,
        config: AcquisitionConfig,
        bus: Option<EventBusRef>,
    ) -> Self {
        let phase = if provider.is_available() {
            AcquisitionPhase::Idle
        } else {
            tracing::info!("geolocation unavailable on this platform, using global fallback");
            AcquisitionPhase::Resolved(None)
        };

        let (tx, _rx) = watch::channel(LocationState::from(&phase));

        Self {
            shared: Arc::new(Shared {
                machine: Mutex::new(Machine {
                    phase,
                    torn_down: false,
                    cancel: None,
                }),
                tx,
                bus,
                teardown: CancellationToken::new(),
            }),
            provider,
            config,
        }
    }

    /// Begin acquiring. Only the first call from `Idle` does anything.
    ///
    /// Spawns onto the current tokio runtime; without one the attempt fails
    /// immediately instead of panicking.
    pub fn start(&self) {
        let mut machine = self.shared.lock();

        if machine.torn_down {
            tracing::warn!("LocationAcquisition already stopped, ignoring start");
            return;
        }
        if machine.phase != AcquisitionPhase::Idle {
            tracing::debug!(phase = ?machine.phase, "location acquisition already started");
            return;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("no async runtime for location acquisition");
                machine.phase = AcquisitionPhase::Failed(
                    LocationError::AcquisitionUnavailable("no async runtime".to_string())
                        .to_string(),
                );
                self.shared.publish(&machine);
                return;
            }
        };

        let token = CancellationToken::new();
        machine.phase = AcquisitionPhase::Acquiring;
        machine.cancel = Some(token.clone());
        self.shared.publish(&machine);
        drop(machine);

        let shared = Arc::clone(&self.shared);
        let provider = Arc::clone(&self.provider);
        let timeout = self.config.timeout;

        handle.spawn(async move {
            tracing::debug!(?timeout, "location acquisition started");

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!("location acquisition cancelled");
                    return;
                }
                outcome = tokio::time::timeout(timeout, acquire(provider.as_ref())) => outcome,
            };

            let phase = match outcome {
                Ok(Ok(location)) => AcquisitionPhase::Resolved(Some(location)),
                Ok(Err(error)) => AcquisitionPhase::Failed(error.to_string()),
                Err(_) => AcquisitionPhase::Failed(LocationError::AcquisitionTimeout.to_string()),
            };

            shared.finish(&token, phase);
        });
    }

    /// Cancel any in-flight attempt and freeze the published state.
    ///
    /// Safe from any state and idempotent.
    pub fn stop(&self) {
        let mut machine = self.shared.lock();
        if machine.torn_down {
            return;
        }
        machine.torn_down = true;
        self.shared.teardown.cancel();

        if let Some(token) = machine.cancel.take() {
            token.cancel();
            tracing::info!("location acquisition stopped mid-flight");
        } else {
            tracing::debug!("location acquisition stopped");
        }
    }

    /// Read-only subscription to the published state.
    pub fn subscribe(&self) -> watch::Receiver<LocationState> {
        self.shared.tx.subscribe()
    }

    /// Current published state.
    pub fn state(&self) -> LocationState {
        self.shared.tx.borrow().clone()
    }

    pub fn phase(&self) -> AcquisitionPhase {
        self.shared.lock().phase.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.lock().torn_down
    }

    /// Wait until the published state settles.
    ///
    /// `None` if the acquisition is stopped before it settles.
    pub async fn settled(&self) -> Option<LocationState> {
        let mut rx = self.subscribe();
        let settled = async move {
            let state = rx.wait_for(LocationState::is_settled).await.ok().map(|s| s.clone());
            state
        };

        tokio::select! {
            biased;
            state = settled => state,
            _ = self.shared.teardown.cancelled() => {
                tracing::debug!("location acquisition stopped before settling");
                None
            }
        }
    }
}

impl Drop for LocationAcquisition {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn acquire(provider: &dyn GeolocationProvider) -> Result<LocationSnapshot, LocationError> {
    match provider.request_permission().await {
        PermissionStatus::Granted => provider.current_position().await,
        PermissionStatus::Denied => Err(LocationError::PermissionDenied),
    }
}
