//! Blocked-user cache behaviour under concurrent readers.

use async_trait::async_trait;
use kindred_profile::{ProfileClient, ProfileError, UserProfile};
use kindred_signals::{BlockedUsersCache, CacheStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Profile client that takes a while to answer.
struct SlowClient {
    calls: AtomicUsize,
}

#[async_trait]
impl ProfileClient for SlowClient {
    async fn current_profile(&self) -> Result<UserProfile, ProfileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        let mut profile = UserProfile::new("me");
        profile.blocked_user_ids = vec!["spammer".to_string()];
        Ok(profile)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_share_one_fetch() {
    let client = Arc::new(SlowClient {
        calls: AtomicUsize::new(0),
    });
    let cache = Arc::new(BlockedUsersCache::new(client.clone()));

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get().await })
        })
        .collect();

    for reader in readers {
        assert_eq!(reader.await.unwrap().unwrap(), vec!["spammer"]);
    }
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.status(), CacheStatus::Ready);
}

#[tokio::test]
async fn test_loading_state_is_observable() {
    let client = Arc::new(SlowClient {
        calls: AtomicUsize::new(0),
    });
    let cache = Arc::new(BlockedUsersCache::new(client));
    let mut status = cache.subscribe_status();

    let loader = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get().await })
    };

    status.changed().await.unwrap();
    assert_eq!(*status.borrow_and_update(), CacheStatus::Loading);

    loader.await.unwrap().unwrap();
    assert_eq!(cache.status(), CacheStatus::Ready);
    assert!(!cache.is_loading());
}

#[tokio::test]
async fn test_abandoned_fetch_resets_loading() {
    let client = Arc::new(SlowClient {
        calls: AtomicUsize::new(0),
    });
    let cache = BlockedUsersCache::new(client.clone());

    let timed_out = tokio::time::timeout(Duration::from_millis(5), cache.get()).await;
    assert!(timed_out.is_err());
    assert_eq!(cache.status(), CacheStatus::Idle);
    assert!(!cache.is_loading());
    assert!(cache.peek().is_none());

    // The next reader fetches again and settles normally.
    assert_eq!(cache.get().await.unwrap(), vec!["spammer"]);
    assert_eq!(cache.status(), CacheStatus::Ready);
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
}
