//! Match event types.

use serde::{Deserialize, Serialize};

/// A match between the current user and another user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchEvent {
    /// The other user's id. Dedup key.
    pub user_id: String,
    pub match_id: String,
}

impl MatchEvent {
    pub fn new(user_id: impl Into<String>, match_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            match_id: match_id.into(),
        }
    }
}

/// A match payload as delivered by a channel, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMatch {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub match_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedMatch {
    #[error("match payload has no user id")]
    MissingUserId,

    #[error("match payload has no match id")]
    MissingMatchId,
}

impl IncomingMatch {
    pub fn new(user_id: impl Into<String>, match_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            match_id: Some(match_id.into()),
        }
    }
}

impl TryFrom<IncomingMatch> for MatchEvent {
    type Error = MalformedMatch;

    fn try_from(incoming: IncomingMatch) -> Result<Self, Self::Error> {
        fn non_blank(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let user_id = non_blank(incoming.user_id).ok_or(MalformedMatch::MissingUserId)?;
        let match_id = non_blank(incoming.match_id).ok_or(MalformedMatch::MissingMatchId)?;
        Ok(MatchEvent { user_id, match_id })
    }
}
