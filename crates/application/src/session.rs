//! Per-session wiring of location, feed selection, matches and UI signals.

use crate::config::SessionConfig;
use kindred_events::EventBusRef;
use kindred_feed::{FeedRequest, FeedSelector, MemoizedSelector};
use kindred_location::platform::NativeProvider;
use kindred_location::{AcquisitionConfig, LocationAcquisition, LocationState};
use kindred_matches::{match_channels, MatchIntake, MatchNotificationDeduper, MatchSenders};
use kindred_profile::{ProfileClient, UserProfile};
use kindred_signals::{BlockedUsersCache, SignalStore};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Running {
    senders: MatchSenders,
    intake: JoinHandle<kindred_matches::IntakeStats>,
}

/// Everything one signed-in app session needs, owned in one place.
///
/// Dropping the session tears it down: location acquisition stops and the
/// match intake is cancelled. Dedup state lives and dies with it.
pub struct Session {
    id: Uuid,
    config: SessionConfig,
    profile: Arc<dyn ProfileClient>,
    location: LocationAcquisition,
    native: Option<Arc<NativeProvider>>,
    selector: MemoizedSelector,
    matches: Arc<MatchNotificationDeduper>,
    signals: SignalStore,
    blocked_users: BlockedUsersCache,
    cancel: CancellationToken,
    running: Mutex<Option<Running>>,
}

impl Session {
    pub fn new(config: SessionConfig, profile: Arc<dyn ProfileClient>, bus: EventBusRef) -> Self {
        let id = Uuid::new_v4();
        let selection = config.platform.select();
        tracing::info!(
            session_id = %id,
            platform = ?config.platform.resolve(),
            "creating session"
        );

        let location = LocationAcquisition::with_event_bus(
            selection.provider,
            AcquisitionConfig {
                timeout: config.location_timeout(),
            },
            bus.clone(),
        );

        Self {
            id,
            selector: MemoizedSelector::new(FeedSelector::new(config.global_feed_id.clone())),
            matches: Arc::new(
                MatchNotificationDeduper::with_queue_limit(config.pending_queue_limit)
                    .with_event_bus(bus.clone()),
            ),
            signals: SignalStore::new().with_event_bus(bus),
            blocked_users: BlockedUsersCache::new(profile.clone()),
            native: selection.native,
            location,
            profile,
            config,
            cancel: CancellationToken::new(),
            running: Mutex::new(None),
        }
    }

    fn running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start location acquisition and match intake on the current runtime.
    ///
    /// Returns the senders the push handler and the poller deliver into.
    /// Calling it again returns the same senders. `None` after `shutdown`
    /// or outside a tokio runtime; the session is left not started.
    pub fn start(&self) -> Option<MatchSenders> {
        let mut running = self.running();
        if let Some(running) = running.as_ref() {
            return Some(running.senders.clone());
        }
        if self.cancel.is_cancelled() {
            tracing::warn!(session_id = %self.id, "session already shut down, ignoring start");
            return None;
        }

        let (senders, receivers) = match_channels(self.config.match_channel_capacity);
        let Some(intake) = MatchIntake::new(Arc::clone(&self.matches))
            .spawn(receivers, self.cancel.child_token())
        else {
            tracing::warn!(session_id = %self.id, "no async runtime, session not started");
            return None;
        };

        self.location.start();

        tracing::info!(session_id = %self.id, "session started");
        *running = Some(Running {
            senders: senders.clone(),
            intake,
        });
        Some(senders)
    }

    /// Stop acquisition and intake. Safe to call more than once.
    pub fn shutdown(&self) {
        self.location.stop();
        self.cancel.cancel();
        if let Some(running) = self.running().take() {
            // The intake exits on cancel; we don't wait for it here.
            drop(running.intake);
            tracing::info!(session_id = %self.id, "session shut down");
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Bridge for the host to feed native permission answers and fixes.
    /// `None` on the web platform.
    pub fn native_bridge(&self) -> Option<&Arc<NativeProvider>> {
        self.native.as_ref()
    }

    pub fn location(&self) -> &LocationAcquisition {
        &self.location
    }

    pub fn subscribe_location(&self) -> watch::Receiver<LocationState> {
        self.location.subscribe()
    }

    /// Feed request for `profile` and the current location.
    pub fn feed_request_for(
        &self,
        profile: Option<&UserProfile>,
        is_news_feed: bool,
        is_fact_check_feed: bool,
    ) -> FeedRequest {
        let scope = FeedSelector::resolve_scope(profile, is_news_feed, is_fact_check_feed);
        self.selector.select(&scope, &self.location.state())
    }

    /// Feed request for the signed-in user. A profile that can't be fetched
    /// degrades to the global feed.
    pub async fn feed_request(&self, is_news_feed: bool, is_fact_check_feed: bool) -> FeedRequest {
        let profile = match self.profile.current_profile().await {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "profile unavailable, using global feed");
                None
            }
        };
        self.feed_request_for(profile.as_ref(), is_news_feed, is_fact_check_feed)
    }

    pub fn matches(&self) -> &MatchNotificationDeduper {
        &self.matches
    }

    /// Called by the match modal when the user dismisses it.
    pub fn acknowledge_match(&self, user_id: &str) -> bool {
        self.matches.acknowledge(user_id)
    }

    pub fn signals(&self) -> &SignalStore {
        &self.signals
    }

    pub fn blocked_users(&self) -> &BlockedUsersCache {
        &self.blocked_users
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
