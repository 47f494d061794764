//! Platform-specific implementations.
//!
//! The provider is chosen once at startup, either from the compile target or
//! from an explicit [`Platform`] override.

mod native;

pub use native::NativeProvider;

use crate::provider::{GeolocationProvider, WebProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Re-export the appropriate provider for the current platform
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformProvider = NativeProvider;

#[cfg(target_arch = "wasm32")]
pub type PlatformProvider = WebProvider;

/// Which geolocation implementation to run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Decide from the compile target.
    #[default]
    Auto,
    Native,
    Web,
}

impl Platform {
    /// Resolve `Auto` to a concrete platform.
    pub fn resolve(self) -> Platform {
        match self {
            Platform::Auto if cfg!(target_arch = "wasm32") => Platform::Web,
            Platform::Auto => Platform::Native,
            other => other,
        }
    }

    /// Build the provider for this platform.
    pub fn select(self) -> ProviderSelection {
        match self.resolve() {
            Platform::Web => ProviderSelection {
                provider: Arc::new(WebProvider::new()),
                native: None,
            },
            _ => {
                let native = Arc::new(NativeProvider::new());
                ProviderSelection {
                    provider: native.clone(),
                    native: Some(native),
                }
            }
        }
    }
}

/// The chosen provider, plus a handle for the host bridge when it is native.
#[derive(Clone)]
pub struct ProviderSelection {
    pub provider: Arc<dyn GeolocationProvider>,
    pub native: Option<Arc<NativeProvider>>,
}
