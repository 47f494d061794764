//! Match intake from the push and poll channels.
//!
//! Both channels deliver at-least-once and may repeat each other. The intake
//! validates payloads, drops malformed ones with a warning, and hands the
//! rest to the deduper, which decides what the user sees.

use crate::deduper::{MatchNotificationDeduper, RecordOutcome};
use crate::event::{IncomingMatch, MatchEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default capacity of each intake channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Where a match payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchChannel {
    /// Push notification delivered by the OS.
    Push,
    /// Foreground poll of the matches endpoint.
    Poll,
}

/// Counters for one intake run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IntakeStats {
    /// Events that became pending or queued.
    pub accepted: u64,
    /// Events the deduper ignored (already notified, pending, or overflowed).
    pub ignored: u64,
    pub malformed: u64,
}

/// Sending halves handed to the push handler and the poller.
#[derive(Clone)]
pub struct MatchSenders {
    pub push: mpsc::Sender<IncomingMatch>,
    pub poll: mpsc::Sender<IncomingMatch>,
}

/// Receiving halves consumed by [`MatchIntake::run`].
pub struct MatchReceivers {
    pub push: mpsc::Receiver<IncomingMatch>,
    pub poll: mpsc::Receiver<IncomingMatch>,
}

/// Create the two bounded intake channels.
pub fn match_channels(capacity: usize) -> (MatchSenders, MatchReceivers) {
    let (push_tx, push_rx) = mpsc::channel(capacity.max(1));
    let (poll_tx, poll_rx) = mpsc::channel(capacity.max(1));
    (
        MatchSenders {
            push: push_tx,
            poll: poll_tx,
        },
        MatchReceivers {
            push: push_rx,
            poll: poll_rx,
        },
    )
}

pub struct MatchIntake {
    deduper: Arc<MatchNotificationDeduper>,
    stats: IntakeStats,
}

impl MatchIntake {
    pub fn new(deduper: Arc<MatchNotificationDeduper>) -> Self {
        Self {
            deduper,
            stats: IntakeStats::default(),
        }
    }

    /// Validate and record one payload. `None` if it was malformed.
    pub fn handle(&mut self, channel: MatchChannel, incoming: IncomingMatch) -> Option<RecordOutcome> {
        let event = match MatchEvent::try_from(incoming) {
            Ok(event) => event,
            Err(e) => {
                self.stats.malformed += 1;
                tracing::warn!(?channel, error = %e, "dropping malformed match payload");
                return None;
            }
        };

        let outcome = self.deduper.record_match(event);
        if outcome.is_accepted() {
            self.stats.accepted += 1;
        } else {
            self.stats.ignored += 1;
        }
        tracing::debug!(?channel, ?outcome, "match delivered");
        Some(outcome)
    }

    pub fn stats(&self) -> IntakeStats {
        self.stats
    }

    /// Drain both channels until cancelled or both senders are gone.
    pub async fn run(mut self, receivers: MatchReceivers, cancel: CancellationToken) -> IntakeStats {
        let MatchReceivers {
            mut push,
            mut poll,
        } = receivers;
        let mut push_open = true;
        let mut poll_open = true;

        tracing::info!("Match intake started");

        while push_open || poll_open {
            let (channel, incoming) = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Match intake cancelled");
                    break;
                }
                msg = push.recv(), if push_open => match msg {
                    Some(incoming) => (MatchChannel::Push, incoming),
                    None => {
                        tracing::debug!("push channel closed");
                        push_open = false;
                        continue;
                    }
                },
                msg = poll.recv(), if poll_open => match msg {
                    Some(incoming) => (MatchChannel::Poll, incoming),
                    None => {
                        tracing::debug!("poll channel closed");
                        poll_open = false;
                        continue;
                    }
                },
            };

            self.handle(channel, incoming);
        }

        tracing::info!(
            accepted = self.stats.accepted,
            ignored = self.stats.ignored,
            malformed = self.stats.malformed,
            "Match intake stopped"
        );
        self.stats
    }

    /// Run on the current tokio runtime. `None` when called outside one.
    pub fn spawn(
        self,
        receivers: MatchReceivers,
        cancel: CancellationToken,
    ) -> Option<JoinHandle<IntakeStats>> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => Some(handle.spawn(self.run(receivers, cancel))),
            Err(_) => {
                tracing::warn!("no async runtime for match intake");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_counts_outcomes() {
        let deduper = Arc::new(MatchNotificationDeduper::new());
        let mut intake = MatchIntake::new(deduper.clone());

        intake.handle(MatchChannel::Push, IncomingMatch::new("u1", "m1"));
        intake.handle(MatchChannel::Poll, IncomingMatch::new("u1", "m1"));
        intake.handle(MatchChannel::Poll, IncomingMatch::default());

        assert_eq!(
            intake.stats(),
            IntakeStats {
                accepted: 1,
                ignored: 1,
                malformed: 1
            }
        );
        assert_eq!(deduper.pending(), Some(MatchEvent::new("u1", "m1")));
    }

    #[tokio::test]
    async fn test_run_stops_when_senders_drop() {
        let deduper = Arc::new(MatchNotificationDeduper::new());
        let (senders, receivers) = match_channels(8);

        senders.push.send(IncomingMatch::new("u1", "m1")).await.unwrap();
        senders.poll.send(IncomingMatch::new("u2", "m2")).await.unwrap();
        drop(senders);

        let stats = MatchIntake::new(deduper.clone())
            .run(receivers, CancellationToken::new())
            .await;

        assert_eq!(stats.accepted, 2);
        assert_eq!(deduper.queued_len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let deduper = Arc::new(MatchNotificationDeduper::new());
        let (_senders, receivers) = match_channels(8);
        let cancel = CancellationToken::new();

        let handle = MatchIntake::new(deduper)
            .spawn(receivers, cancel.clone())
            .unwrap();
        cancel.cancel();

        let stats = handle.await.unwrap();
        assert_eq!(stats, IntakeStats::default());
    }

    #[test]
    fn test_spawn_without_runtime_returns_none() {
        let deduper = Arc::new(MatchNotificationDeduper::new());
        let (_senders, receivers) = match_channels(8);

        let handle = MatchIntake::new(deduper).spawn(receivers, CancellationToken::new());
        assert!(handle.is_none());
    }
}
