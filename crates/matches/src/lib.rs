//! Match notifications.
//!
//! A match can reach the client through a push notification and a
//! foreground poll at the same time, and either channel may repeat itself.
//! [`MatchNotificationDeduper`] makes sure the user sees each matched person
//! at most once per session; [`MatchIntake`] feeds it from both channels.

mod deduper;
mod event;
mod intake;

pub use deduper::{MatchNotificationDeduper, RecordOutcome, DEFAULT_PENDING_QUEUE_LIMIT};
pub use event::{IncomingMatch, MalformedMatch, MatchEvent};
pub use intake::{
    match_channels, IntakeStats, MatchChannel, MatchIntake, MatchReceivers, MatchSenders,
    DEFAULT_CHANNEL_CAPACITY,
};
