//! Ephemeral UI signals.
//!
//! Replaces ambient global flags with one explicitly owned store per session.
//! Every field lists its writers; everything else only subscribes.

mod cache;
mod store;

pub use cache::{BlockedUsersCache, CacheEntry, CacheStatus, BLOCKED_USERS_CACHE_KEY};
pub use store::{FeedTab, SignalStore, UiSignals};
