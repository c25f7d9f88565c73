//! Session domain types.
//!
//! A session is one complete debate run. Its metadata is fixed when the run
//! starts; only the transcript grows afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a debate session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the roster is ordered within each round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPolicy {
    /// Every round follows roster order.
    Identity,
    /// Every round gets a fresh random permutation of the roster.
    #[default]
    Shuffle,
}

impl std::fmt::Display for OrderPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::Shuffle => write!(f, "shuffle"),
        }
    }
}

/// Metadata for one debate run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,

    /// The topic or question under debate
    pub topic: String,

    /// Number of full rounds
    pub round_count: u32,

    /// Debating agents, in roster order (no duplicates)
    pub roster: Vec<String>,

    pub order_policy: OrderPolicy,

    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a session with a fresh id.
    pub fn new(
        topic: impl Into<String>,
        round_count: u32,
        roster: Vec<String>,
        order_policy: OrderPolicy,
    ) -> Self {
        Self {
            id: SessionId::new(),
            topic: topic.into(),
            round_count,
            roster,
            order_policy,
            created_at: Utc::now(),
        }
    }

    /// The reserved round index used for the closing summary turn.
    pub fn summary_round(&self) -> u32 {
        self.round_count + 1
    }
}
