//! Feed scoping.
//!
//! Turns "which feed does this screen show" plus the current location state
//! into the request the feed backend receives. Location only ever narrows a
//! feed; its absence never stops one from rendering.

mod scope;
mod selector;

pub use scope::{FeedRequest, FeedScope, LocationFilter, GLOBAL_FEED_ID};
pub use selector::{FeedError, FeedSelector, MemoizedSelector};
