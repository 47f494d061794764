//! User profile model and the profile collaborator seam.
//!
//! The backend that actually serves profiles lives outside this workspace.
//! Everything here depends on [`ProfileClient`] so it can be exercised with
//! [`StaticProfileClient`] in tests and headless runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// The slice of the signed-in user's profile the core cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,

    /// Feed the user picked as their news feed. Absent for new accounts.
    #[serde(default)]
    pub preferred_news_feed_id: Option<String>,

    #[serde(default)]
    pub blocked_user_ids: Vec<String>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Preferred feed id, treating a blank value the same as a missing one.
    pub fn preferred_feed_id(&self) -> Option<&str> {
        self.preferred_news_feed_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProfileError {
    #[error("no signed-in user")]
    NotSignedIn,

    #[error("profile request failed: {0}")]
    Request(String),
}

pub type Result<T> = std::result::Result<T, ProfileError>;

/// Collaborator that serves the current user's profile.
#[async_trait]
pub trait ProfileClient: Send + Sync {
    async fn current_profile(&self) -> Result<UserProfile>;

    /// Ids of users the current user has blocked.
    async fn blocked_user_ids(&self) -> Result<Vec<String>> {
        Ok(self.current_profile().await?.blocked_user_ids)
    }
}

/// In-memory profile client. Counts fetches so callers can verify caching.
#[derive(Debug, Default)]
pub struct StaticProfileClient {
    profile: RwLock<Option<UserProfile>>,
    fetches: AtomicUsize,
}

impl StaticProfileClient {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile: RwLock::new(Some(profile)),
            fetches: AtomicUsize::new(0),
        }
    }

    /// A client with nobody signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub async fn replace(&self, profile: UserProfile) {
        *self.profile.write().await = Some(profile);
    }

    /// Number of completed profile fetches.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileClient for StaticProfileClient {
    async fn current_profile(&self) -> Result<UserProfile> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.profile
            .read()
            .await
            .clone()
            .ok_or(ProfileError::NotSignedIn)
    }
}
