//! Read-through cache for the blocked-user list.

use kindred_profile::{ProfileClient, ProfileError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::watch;

/// Cache key the blocked-user list is stored under.
pub const BLOCKED_USERS_CACHE_KEY: &str = "blocked-users";

/// Load state exposed to screens that show a spinner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum CacheStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fetched_at: Instant,
    pub user_ids: Vec<String>,
}

/// Marks the status `Loading` for the duration of one fetch.
///
/// A fetch that is dropped before it finishes puts the status back to `Idle`.
struct LoadingGuard<'a> {
    status: &'a watch::Sender<CacheStatus>,
    finished: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(status: &'a watch::Sender<CacheStatus>) -> Self {
        status.send_replace(CacheStatus::Loading);
        Self {
            status,
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::debug!("blocked users fetch abandoned");
        self.status.send_if_modified(|status| {
            if *status != CacheStatus::Loading {
                return false;
            }
            *status = CacheStatus::Idle;
            true
        });
    }
}

/// Blocked-user ids, fetched from the profile collaborator once and then
/// served from memory until invalidated.
pub struct BlockedUsersCache {
    client: Arc<dyn ProfileClient>,
    entries: Mutex<HashMap<String, CacheEntry>>,
    status: watch::Sender<CacheStatus>,
    /// Serializes fetches so concurrent readers share one request.
    load: tokio::sync::Mutex<()>,
}

impl BlockedUsersCache {
    pub fn new(client: Arc<dyn ProfileClient>) -> Self {
        Self {
            client,
            entries: Mutex::new(HashMap::new()),
            status: watch::Sender::new(CacheStatus::Idle),
            load: tokio::sync::Mutex::new(()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached ids without triggering a fetch.
    pub fn peek(&self) -> Option<Vec<String>> {
        self.entries()
            .get(BLOCKED_USERS_CACHE_KEY)
            .map(|entry| entry.user_ids.clone())
    }

    /// When the cached list was fetched, if there is one.
    pub fn fetched_at(&self) -> Option<Instant> {
        self.entries()
            .get(BLOCKED_USERS_CACHE_KEY)
            .map(|entry| entry.fetched_at)
    }

    /// Cached ids, fetching them first if needed.
    pub async fn get(&self) -> Result<Vec<String>, ProfileError> {
        if let Some(ids) = self.peek() {
            return Ok(ids);
        }

        let _loading = self.load.lock().await;
        // Another caller may have filled the cache while we waited.
        if let Some(ids) = self.peek() {
            return Ok(ids);
        }

        let mut loading = LoadingGuard::new(&self.status);
        let result = self.client.blocked_user_ids().await;
        loading.finish();

        match result {
            Ok(user_ids) => {
                tracing::debug!(count = user_ids.len(), "blocked users loaded");
                self.entries().insert(
                    BLOCKED_USERS_CACHE_KEY.to_string(),
                    CacheEntry {
                        fetched_at: Instant::now(),
                        user_ids: user_ids.clone(),
                    },
                );
                self.status.send_replace(CacheStatus::Ready);
                Ok(user_ids)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load blocked users");
                self.status.send_replace(CacheStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Whether `user_id` is in the cached list. Unknown until loaded.
    pub fn is_blocked(&self, user_id: &str) -> Option<bool> {
        self.entries()
            .get(BLOCKED_USERS_CACHE_KEY)
            .map(|entry| entry.user_ids.iter().any(|id| id == user_id))
    }

    /// Drop the cached list; the next `get` refetches.
    pub fn invalidate(&self) {
        self.entries().remove(BLOCKED_USERS_CACHE_KEY);
        self.status.send_replace(CacheStatus::Idle);
    }

    pub fn status(&self) -> CacheStatus {
        self.status.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        *self.status.borrow() == CacheStatus::Loading
    }

    pub fn subscribe_status(&self) -> watch::Receiver<CacheStatus> {
        self.status.subscribe()
    }
}
