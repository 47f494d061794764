//! At-most-once match notification guard.

use crate::event::MatchEvent;
use kindred_events::{event_names, EventBusRef, MatchAcknowledgedEvent, MatchPendingEvent};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

/// Default number of matches that may wait behind the visible one.
pub const DEFAULT_PENDING_QUEUE_LIMIT: usize = 32;

/// What `record_match` did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The match is now the visible pending notification.
    Pending,
    /// Another match is visible; this one waits at `position` (1-based) behind it.
    Queued { position: usize },
    /// The user was already notified this session. No effect.
    AlreadyNotified,
    /// The user is already pending or queued. No effect.
    AlreadyPending,
    /// Queue full, event dropped. A later redelivery may still surface it.
    Overflow,
}

impl RecordOutcome {
    /// Whether the event changed the deduper's state.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Pending | Self::Queued { .. })
    }
}

#[derive(Default)]
struct DedupState {
    /// User ids notified this session. Only ever grows.
    notified: HashSet<String>,
    /// Front is the visible pending match.
    pending: VecDeque<MatchEvent>,
}

/// Ensures a match with a given user is surfaced at most once per session.
///
/// Every check-then-write runs under one lock with no suspension point, so
/// concurrent deliveries of the same match cannot both become pending.
pub struct MatchNotificationDeduper {
    state: Mutex<DedupState>,
    queue_limit: usize,
    visible: watch::Sender<Option<MatchEvent>>,
    bus: Option<EventBusRef>,
}

impl Default for MatchNotificationDeduper {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchNotificationDeduper {
    pub fn new() -> Self {
        Self::with_queue_limit(DEFAULT_PENDING_QUEUE_LIMIT)
    }

    /// `queue_limit` counts matches waiting behind the visible one.
    pub fn with_queue_limit(queue_limit: usize) -> Self {
        Self {
            state: Mutex::new(DedupState::default()),
            queue_limit,
            visible: watch::Sender::new(None),
            bus: None,
        }
    }

    /// Also emit `match:pending` / `match:acknowledged` on `bus`.
    pub fn with_event_bus(mut self, bus: EventBusRef) -> Self {
        self.bus = Some(bus);
        self
    }

    fn lock(&self) -> MutexGuard<'_, DedupState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Offer a match for display.
    pub fn record_match(&self, event: MatchEvent) -> RecordOutcome {
        let mut state = self.lock();

        if state.notified.contains(&event.user_id) {
            tracing::trace!(user_id = %event.user_id, "match already notified");
            return RecordOutcome::AlreadyNotified;
        }
        if state.pending.iter().any(|p| p.user_id == event.user_id) {
            tracing::debug!(user_id = %event.user_id, match_id = %event.match_id, "duplicate match delivery");
            return RecordOutcome::AlreadyPending;
        }
        if state.pending.len() > self.queue_limit {
            tracing::warn!(
                user_id = %event.user_id,
                limit = self.queue_limit,
                "match queue full, dropping"
            );
            return RecordOutcome::Overflow;
        }

        state.pending.push_back(event);

        if state.pending.len() == 1 {
            self.publish_front(&state);
            RecordOutcome::Pending
        } else {
            let position = state.pending.len() - 1;
            tracing::debug!(position, "match queued behind visible notification");
            RecordOutcome::Queued { position }
        }
    }

    /// Mark `user_id` as notified and clear it from the pending queue.
    ///
    /// Returns true if the user was not already notified.
    pub fn acknowledge(&self, user_id: &str) -> bool {
        let mut state = self.lock();

        let newly_notified = state.notified.insert(user_id.to_string());
        let was_visible = state
            .pending
            .front()
            .is_some_and(|front| front.user_id == user_id);
        state.pending.retain(|p| p.user_id != user_id);

        if newly_notified {
            tracing::info!(user_id, "match acknowledged");
            if let Some(bus) = &self.bus {
                kindred_events::emit_serialized(
                    bus.as_ref(),
                    event_names::MATCH_ACKNOWLEDGED,
                    &MatchAcknowledgedEvent {
                        user_id: user_id.to_string(),
                    },
                );
            }
        }

        if was_visible {
            self.publish_front(&state);
        }

        newly_notified
    }

    /// Publish whatever is at the front of the queue as the visible match.
    fn publish_front(&self, state: &DedupState) {
        let front = state.pending.front().cloned();

        if let (Some(event), Some(bus)) = (&front, &self.bus) {
            kindred_events::emit_serialized(
                bus.as_ref(),
                event_names::MATCH_PENDING,
                &MatchPendingEvent {
                    user_id: event.user_id.clone(),
                    match_id: event.match_id.clone(),
                    queued: state.pending.len().saturating_sub(1),
                },
            );
        }

        self.visible.send_replace(front);
    }

    /// The match currently awaiting acknowledgment.
    pub fn pending(&self) -> Option<MatchEvent> {
        self.lock().pending.front().cloned()
    }

    pub fn has_pending(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    /// Matches waiting behind the visible one.
    pub fn queued_len(&self) -> usize {
        self.lock().pending.len().saturating_sub(1)
    }

    pub fn is_notified(&self, user_id: &str) -> bool {
        self.lock().notified.contains(user_id)
    }

    pub fn notified_count(&self) -> usize {
        self.lock().notified.len()
    }

    /// Watch the visible pending match.
    pub fn subscribe(&self) -> watch::Receiver<Option<MatchEvent>> {
        self.visible.subscribe()
    }
}
