//! End-to-end tests for a session wired to in-memory collaborators.

use kindred_application::events::{event_names, InMemoryEventBus, MatchPendingEvent};
use kindred_application::feed::FeedRequest;
use kindred_application::location::platform::Platform;
use kindred_application::location::{AcquisitionPhase, LocationSnapshot, PermissionStatus};
use kindred_application::matches::{IncomingMatch, MatchEvent};
use kindred_application::profile::{StaticProfileClient, UserProfile};
use kindred_application::signals::FeedTab;
use kindred_application::{Session, SessionConfig};
use std::sync::Arc;
use std::time::Duration;

fn profile(feed: Option<&str>) -> Arc<StaticProfileClient> {
    let mut profile = UserProfile::new("me");
    profile.preferred_news_feed_id = feed.map(str::to_string);
    Arc::new(StaticProfileClient::new(profile))
}

fn config(platform: Platform) -> SessionConfig {
    SessionConfig {
        platform,
        ..Default::default()
    }
}

async fn wait_for_pending(session: &Session) -> MatchEvent {
    let mut rx = session.matches().subscribe();
    let pending = rx
        .wait_for(Option::is_some)
        .await
        .unwrap()
        .clone()
        .unwrap();
    pending
}

#[tokio::test]
async fn test_web_session_renders_unfiltered_feed_immediately() {
    let bus = Arc::new(InMemoryEventBus::new());
    let session = Session::new(config(Platform::Web), profile(Some("sf-news")), bus);
    session.start().unwrap();

    assert!(session.native_bridge().is_none());
    let state = session.location().state();
    assert!(!state.is_acquiring());
    assert!(state.location().is_none());
    assert!(state.error_msg().is_none());

    let request = session.feed_request(true, false).await;
    assert_eq!(request.feed_id, "sf-news");
    assert!(request.is_news_feed);
    assert!(!request.has_location_filter());
}

#[tokio::test]
async fn test_native_session_attaches_location_once_known() {
    let bus = Arc::new(InMemoryEventBus::new());
    let session = Session::new(config(Platform::Native), profile(Some("sf-news")), bus.clone());
    session.start().unwrap();

    // Before the device answers, the feed still renders.
    assert!(!session.feed_request(true, false).await.has_location_filter());

    let bridge = session.native_bridge().unwrap();
    bridge.set_permission(PermissionStatus::Granted);
    bridge.push_fix(LocationSnapshot::new(37.7, -122.4));
    session.location().settled().await.unwrap();

    let request = session.feed_request(true, false).await;
    let filter = request.location_filter.unwrap();
    assert_eq!((filter.latitude, filter.longitude), (37.7, -122.4));
    assert!(!bus.events_for(event_names::LOCATION_CHANGED).is_empty());
}

#[tokio::test]
async fn test_missing_feed_id_degrades_to_global() {
    let session = Session::new(
        config(Platform::Web),
        profile(None),
        Arc::new(InMemoryEventBus::new()),
    );

    let request = session.feed_request(true, true).await;
    assert_eq!(request, FeedRequest::global("global"));
}

#[tokio::test]
async fn test_signed_out_profile_degrades_to_global() {
    let session = Session::new(
        config(Platform::Web),
        Arc::new(StaticProfileClient::signed_out()),
        Arc::new(InMemoryEventBus::new()),
    );

    assert_eq!(
        session.feed_request(false, false).await,
        FeedRequest::global("global")
    );
}

#[tokio::test]
async fn test_match_from_both_channels_is_shown_once() {
    let bus = Arc::new(InMemoryEventBus::new());
    let session = Session::new(config(Platform::Web), profile(None), bus.clone());
    let senders = session.start().unwrap();

    senders.push.send(IncomingMatch::new("u1", "m1")).await.unwrap();
    senders.poll.send(IncomingMatch::new("u1", "m1")).await.unwrap();

    let pending = wait_for_pending(&session).await;
    assert_eq!(pending, MatchEvent::new("u1", "m1"));

    assert!(session.acknowledge_match("u1"));
    senders.poll.send(IncomingMatch::new("u1", "m1")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!session.matches().has_pending());
    let shown: Vec<MatchPendingEvent> = bus.payloads_for(event_names::MATCH_PENDING);
    assert_eq!(shown.len(), 1);
}

#[tokio::test]
async fn test_start_is_idempotent_and_shutdown_stops_location() {
    let session = Session::new(
        config(Platform::Native),
        profile(None),
        Arc::new(InMemoryEventBus::new()),
    );
    let first = session.start().unwrap();
    let second = session.start().unwrap();
    assert!(first.push.same_channel(&second.push));

    session.shutdown();
    session.shutdown();
    assert!(session.location().is_stopped());

    session
        .native_bridge()
        .unwrap()
        .set_permission(PermissionStatus::Granted);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(session.location().state().is_acquiring());
}

#[tokio::test]
async fn test_signals_are_session_scoped() {
    let a = Session::new(config(Platform::Web), profile(None), Arc::new(InMemoryEventBus::new()));
    let b = Session::new(config(Platform::Web), profile(None), Arc::new(InMemoryEventBus::new()));

    a.signals().set_active_tab(FeedTab::Top);
    assert_eq!(a.signals().snapshot().active_tab, FeedTab::Top);
    assert_eq!(b.signals().snapshot().active_tab, FeedTab::Recent);
    assert_ne!(a.id(), b.id());
}

#[tokio::test]
async fn test_start_after_shutdown_is_refused() {
    let session = Session::new(
        config(Platform::Native),
        profile(None),
        Arc::new(InMemoryEventBus::new()),
    );
    session.shutdown();

    assert!(session.start().is_none());
    assert_eq!(session.location().phase(), AcquisitionPhase::Idle);
}

#[test]
fn test_start_without_runtime_leaves_session_idle() {
    let session = Session::new(
        config(Platform::Native),
        profile(None),
        Arc::new(InMemoryEventBus::new()),
    );

    assert!(session.start().is_none());
    assert_eq!(session.location().phase(), AcquisitionPhase::Idle);
    assert!(!session.matches().has_pending());
}
