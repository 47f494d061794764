//! Device location for feed scoping.
//!
//! Obtains the device location once per session and publishes it as a
//! read-only [`LocationState`]. Permission refusal, hardware failure and
//! timeouts all end as data in `error_msg`; nothing here returns an error to
//! the reader.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  state.rs    - LocationState, AcquisitionPhase, errors       │
//! │  provider.rs - GeolocationProvider trait, WebProvider        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Infrastructure Layer                        │
//! │  platform/native.rs - bridge-fed device provider             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Application Layer                          │
//! │  acquisition.rs - start/stop lifecycle, timeout, publishing  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use kindred_location::{platform::Platform, AcquisitionConfig, LocationAcquisition};
//!
//! let selection = Platform::Auto.select();
//! let acquisition = LocationAcquisition::new(selection.provider, AcquisitionConfig::default());
//! acquisition.start();
//!
//! let mut rx = acquisition.subscribe();
//! while rx.changed().await.is_ok() {
//!     println!("{:?}", *rx.borrow());
//! }
//! ```

mod acquisition;
mod provider;
mod state;

pub mod platform;

pub use acquisition::{AcquisitionConfig, LocationAcquisition, DEFAULT_ACQUISITION_TIMEOUT};
pub use provider::{GeolocationProvider, PermissionStatus, WebProvider};
pub use state::{AcquisitionPhase, LocationError, LocationSnapshot, LocationState};
