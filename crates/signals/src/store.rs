//! UI signal store.

use kindred_events::{event_names, EventBusRef, SignalChangedEvent};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Tabs on the comment sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedTab {
    #[default]
    Recent,
    Top,
}

/// Small flags screens read to coordinate with each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSignals {
    /// Written by `open_comments` / `close_comments`.
    pub comment_sheet_open: bool,

    /// Post the comment sheet is showing. Written with `comment_sheet_open`.
    pub comment_target_id: Option<String>,

    /// Written by `set_active_tab`.
    pub active_tab: FeedTab,

    /// Written by `request_input_focus` / `clear_input_focus` / `close_comments`.
    pub input_focus_requested: bool,

    /// Millisecond timestamp of the last scroll-to-top request. Strictly
    /// increasing. Written by `trigger_scroll_to_top`.
    pub scroll_to_top_at: Option<i64>,
}

/// Session-scoped store for [`UiSignals`] with change notification.
///
/// Subscribers are woken only when a write actually changes something.
pub struct SignalStore {
    tx: watch::Sender<UiSignals>,
    bus: Option<EventBusRef>,
}

impl Default for SignalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalStore {
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(UiSignals::default()),
            bus: None,
        }
    }

    /// Also emit `signals:changed` on `bus` for every effective write.
    pub fn with_event_bus(mut self, bus: EventBusRef) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<UiSignals> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> UiSignals {
        self.tx.borrow().clone()
    }

    fn update(&self, field: &'static str, apply: impl FnOnce(&mut UiSignals) -> bool) -> bool {
        let changed = self.tx.send_if_modified(apply);
        if changed {
            tracing::trace!(field, "ui signal changed");
            if let Some(bus) = &self.bus {
                kindred_events::emit_serialized(
                    bus.as_ref(),
                    event_names::SIGNAL_CHANGED,
                    &SignalChangedEvent {
                        field: field.to_string(),
                    },
                );
            }
        }
        changed
    }

    /// Open the comment sheet on `target_id`.
    pub fn open_comments(&self, target_id: impl Into<String>) -> bool {
        let target_id = Some(target_id.into());
        self.update("comment_sheet_open", |s| {
            if s.comment_sheet_open && s.comment_target_id == target_id {
                return false;
            }
            s.comment_sheet_open = true;
            s.comment_target_id = target_id;
            true
        })
    }

    /// Close the comment sheet, dropping its target and any focus request.
    pub fn close_comments(&self) -> bool {
        self.update("comment_sheet_open", |s| {
            if !s.comment_sheet_open && s.comment_target_id.is_none() && !s.input_focus_requested
            {
                return false;
            }
            s.comment_sheet_open = false;
            s.comment_target_id = None;
            s.input_focus_requested = false;
            true
        })
    }

    pub fn set_active_tab(&self, tab: FeedTab) -> bool {
        self.update("active_tab", |s| {
            if s.active_tab == tab {
                return false;
            }
            s.active_tab = tab;
            true
        })
    }

    pub fn request_input_focus(&self) -> bool {
        self.update("input_focus_requested", |s| {
            !std::mem::replace(&mut s.input_focus_requested, true)
        })
    }

    /// Called by the composer once it has taken focus.
    pub fn clear_input_focus(&self) -> bool {
        self.update("input_focus_requested", |s| {
            std::mem::replace(&mut s.input_focus_requested, false)
        })
    }

    /// Ask the active feed to scroll to the top. Returns the new trigger value.
    pub fn trigger_scroll_to_top(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let mut stamp = now;
        self.update("scroll_to_top_at", |s| {
            stamp = match s.scroll_to_top_at {
                Some(prev) if prev >= now => prev + 1,
                _ => now,
            };
            s.scroll_to_top_at = Some(stamp);
            true
        });
        stamp
    }
}
