//! Composition root for the kindred core.
//!
//! A [`Session`] owns one instance of every core component for the lifetime
//! of a signed-in app session and wires them to a shared event bus.

mod config;
mod session;
mod telemetry;

pub use config::{ConfigError, SessionConfig, ENV_LOCATION_TIMEOUT_MS, ENV_PLATFORM};
pub use session::Session;
pub use telemetry::{init_tracing, DEFAULT_LOG_FILTER};

// Re-export the component crates so hosts depend on one crate.
pub use kindred_events as events;
pub use kindred_feed as feed;
pub use kindred_location as location;
pub use kindred_matches as matches;
pub use kindred_profile as profile;
pub use kindred_signals as signals;
