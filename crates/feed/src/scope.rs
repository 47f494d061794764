//! Feed scope and request descriptors.

use kindred_location::LocationSnapshot;
use serde::{Deserialize, Serialize};

/// Feed id requested when nothing more specific is available.
pub const GLOBAL_FEED_ID: &str = "global";

/// What content set a screen wants, before location is considered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedScope {
    /// Resolved from the user's profile; absent for users who never picked one.
    #[serde(default)]
    pub feed_id: Option<String>,
    #[serde(default)]
    pub is_news_feed: bool,
    #[serde(default)]
    pub is_fact_check_feed: bool,
}

impl FeedScope {
    pub fn new(feed_id: impl Into<String>) -> Self {
        Self {
            feed_id: Some(feed_id.into()),
            ..Default::default()
        }
    }

    pub fn news(mut self) -> Self {
        self.is_news_feed = true;
        self
    }

    pub fn fact_check(mut self) -> Self {
        self.is_fact_check_feed = true;
        self
    }
}

/// Location hint attached to a feed request. The feed backend decides what
/// to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFilter {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&LocationSnapshot> for LocationFilter {
    fn from(snapshot: &LocationSnapshot) -> Self {
        Self {
            latitude: snapshot.latitude,
            longitude: snapshot.longitude,
        }
    }
}

/// Parameters handed to the feed-fetching collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    pub feed_id: String,
    pub is_news_feed: bool,
    pub is_fact_check_feed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_filter: Option<LocationFilter>,
}

impl FeedRequest {
    /// The location-independent request every screen can always render.
    pub fn global(feed_id: impl Into<String>) -> Self {
        Self {
            feed_id: feed_id.into(),
            is_news_feed: false,
            is_fact_check_feed: false,
            location_filter: None,
        }
    }

    pub fn has_location_filter(&self) -> bool {
        self.location_filter.is_some()
    }
}
