//! Example: Drive one session through location, feed selection and matches.
//!
//! Run with: cargo run -p kindred-application --example session_demo

use kindred_application::events::TracingEventBus;
use kindred_application::location::platform::Platform;
use kindred_application::location::{LocationSnapshot, PermissionStatus};
use kindred_application::matches::IncomingMatch;
use kindred_application::profile::{StaticProfileClient, UserProfile};
use kindred_application::{init_tracing, Session, SessionConfig};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = SessionConfig {
        platform: Platform::Native,
        ..Default::default()
    }
    .with_env_overrides()?;

    let mut profile = UserProfile::new("demo-user");
    profile.preferred_news_feed_id = Some("bay-area-news".to_string());

    let session = Session::new(
        config,
        Arc::new(StaticProfileClient::new(profile)),
        Arc::new(TracingEventBus),
    );
    let senders = session
        .start()
        .ok_or_else(|| anyhow::anyhow!("session could not start"))?;

    println!("=== Session {} ===", session.id());
    println!("Before location: {:?}", session.feed_request(true, false).await);

    // Stand in for the host's permission dialog and GPS callback.
    if let Some(bridge) = session.native_bridge() {
        bridge.set_permission(PermissionStatus::Granted);
        bridge.push_fix(LocationSnapshot::new(37.7749, -122.4194));
    }

    let state = tokio::time::timeout(Duration::from_secs(2), session.location().settled()).await?;
    println!("Location settled: {:?}", state);
    println!("After location:  {:?}", session.feed_request(true, false).await);

    // The same match arrives from push and from polling.
    senders.push.send(IncomingMatch::new("u-42", "m-7")).await?;
    senders.poll.send(IncomingMatch::new("u-42", "m-7")).await?;
    senders.poll.send(IncomingMatch::new("u-43", "m-8")).await?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!(
        "Showing {:?} with {} queued",
        session.matches().pending(),
        session.matches().queued_len()
    );

    session.acknowledge_match("u-42");
    println!("After dismiss: {:?}", session.matches().pending());

    session.shutdown();
    println!("\nDone.");
    Ok(())
}
