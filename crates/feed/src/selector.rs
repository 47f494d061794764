//! Feed selection logic.
//!
//! Pure domain logic - no I/O, no platform dependencies.

use crate::scope::{FeedRequest, FeedScope, LocationFilter, GLOBAL_FEED_ID};
use kindred_location::LocationState;
use kindred_profile::UserProfile;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("profile has no preferred news feed id")]
    MissingProfileFeedId,
}

/// Maps a feed scope and the current location state to a feed request.
#[derive(Debug, Clone)]
pub struct FeedSelector {
    global_feed_id: String,
}

impl Default for FeedSelector {
    fn default() -> Self {
        Self::new(GLOBAL_FEED_ID)
    }
}

impl FeedSelector {
    pub fn new(global_feed_id: impl Into<String>) -> Self {
        Self {
            global_feed_id: global_feed_id.into(),
        }
    }

    pub fn global_feed_id(&self) -> &str {
        &self.global_feed_id
    }

    /// Build a scope from the profile's preferred news feed.
    ///
    /// A missing profile or feed id leaves `feed_id` empty; [`select`](Self::select)
    /// turns that into the global fallback.
    pub fn resolve_scope(
        profile: Option<&UserProfile>,
        is_news_feed: bool,
        is_fact_check_feed: bool,
    ) -> FeedScope {
        FeedScope {
            feed_id: profile
                .and_then(UserProfile::preferred_feed_id)
                .map(str::to_string),
            is_news_feed,
            is_fact_check_feed,
        }
    }

    /// The scope's feed id, or why there isn't one.
    pub fn try_feed_id(scope: &FeedScope) -> Result<&str, FeedError> {
        scope
            .feed_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(FeedError::MissingProfileFeedId)
    }

    /// The location-independent request used when nothing better is known.
    pub fn global_fallback(&self) -> FeedRequest {
        FeedRequest::global(self.global_feed_id.clone())
    }

    /// Resolve the request for `scope` given `location`.
    ///
    /// Priority:
    /// 1. Missing feed id → global fallback, no location filter
    /// 2. Location known → scope with location filter
    /// 3. Otherwise (acquiring, failed, unsupported) → scope without filter
    ///
    /// Never blocks on location and never fails.
    pub fn select(&self, scope: &FeedScope, location: &LocationState) -> FeedRequest {
        let feed_id = match Self::try_feed_id(scope) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(error = %e, "falling back to global feed");
                return self.global_fallback();
            }
        };

        let location_filter = location.location().map(LocationFilter::from);
        if location_filter.is_none() && location.is_settled() {
            tracing::debug!(
                feed_id,
                error = location.error_msg(),
                "no location, requesting unfiltered feed"
            );
        }

        FeedRequest {
            feed_id: feed_id.to_string(),
            is_news_feed: scope.is_news_feed,
            is_fact_check_feed: scope.is_fact_check_feed,
            location_filter,
        }
    }
}

/// A [`FeedSelector`] that reuses its last answer when the inputs repeat.
#[derive(Debug, Default)]
pub struct MemoizedSelector {
    selector: FeedSelector,
    last: Mutex<Option<(FeedScope, LocationState, FeedRequest)>>,
}

impl MemoizedSelector {
    pub fn new(selector: FeedSelector) -> Self {
        Self {
            selector,
            last: Mutex::new(None),
        }
    }

    pub fn select(&self, scope: &FeedScope, location: &LocationState) -> FeedRequest {
        let mut last = self
            .last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some((cached_scope, cached_location, request)) = last.as_ref() {
            if cached_scope == scope && cached_location == location {
                return request.clone();
            }
        }

        let request = self.selector.select(scope, location);
        *last = Some((scope.clone(), location.clone(), request.clone()));
        request
    }

    pub fn selector(&self) -> &FeedSelector {
        &self.selector
    }
}
