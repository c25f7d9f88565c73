//! TranscriptStore trait: durable, append-only session transcripts.
//!
//! The orchestrator calls the store explicitly after every turn; there is no
//! implicit change propagation. Each session id owns at most one record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;
use crate::session::{Session, SessionId};
use crate::turn::{Transcript, Turn};

/// The persisted form of a session and its transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub session_id: SessionId,

    pub topic: String,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub rounds: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roster: Vec<String>,

    #[serde(default)]
    pub turns: Vec<Turn>,
}

impl MemoryRecord {
    /// An empty record for a freshly started session.
    pub fn for_session(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            topic: session.topic.clone(),
            created_at: session.created_at,
            rounds: session.round_count,
            roster: session.roster.clone(),
            turns: Vec::new(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            topic: self.topic.clone(),
            created_at: self.created_at,
            turn_count: self.turns.len(),
        }
    }

    /// Append a turn, keeping (round, turn) strictly increasing.
    pub fn push_turn(&mut self, turn: Turn) -> std::result::Result<(), MemoryError> {
        if let Some(last) = self.turns.last() {
            if (turn.round_index, turn.turn_index) <= (last.round_index, last.turn_index) {
                return Err(MemoryError::Storage(format!(
                    "out-of-order append to {}: ({}, {}) after ({}, {})",
                    self.session_id, turn.round_index, turn.turn_index, last.round_index, last.turn_index
                )));
            }
        }
        self.turns.push(turn);
        Ok(())
    }

    /// The turns as an ordered transcript.
    pub fn transcript(&self) -> Transcript {
        // Records are only ever built through ordered appends; fall back to an
        // empty transcript if a hand-edited file broke the ordering.
        Transcript::try_from(self.turns.clone()).unwrap_or_default()
    }
}

/// A short listing entry for one stored session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub topic: String,
    pub created_at: DateTime<Utc>,
    pub turn_count: usize,
}

/// A turn matched by a transcript search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub session_id: SessionId,
    pub topic: String,
    pub turn: Turn,
}

/// The core TranscriptStore trait.
///
/// Implementations: JSON files (one per session), in-memory (tests and
/// `memory.persist = false`).
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// The store name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Register a session before its first append. An existing record with
    /// the same id is kept as is.
    async fn begin(&self, session: &Session) -> std::result::Result<(), MemoryError>;

    /// Load the transcript for a session, or `None` if nothing is stored.
    ///
    /// Unreadable records come back as an empty transcript, not an error.
    async fn load(&self, id: &SessionId) -> std::result::Result<Option<Transcript>, MemoryError>;

    /// Append one turn. Returns once the turn is durable.
    async fn append(&self, id: &SessionId, turn: Turn) -> std::result::Result<(), MemoryError>;

    /// The full record for a session.
    async fn record(&self, id: &SessionId) -> std::result::Result<Option<MemoryRecord>, MemoryError>;

    /// All stored sessions, newest first.
    async fn list(&self) -> std::result::Result<Vec<SessionSummary>, MemoryError>;

    /// Case-insensitive substring search over turn content, newest first.
    async fn search(&self, query: &str, limit: usize) -> std::result::Result<Vec<SearchHit>, MemoryError>;

    /// Delete a session record. Returns whether anything was removed.
    async fn delete(&self, id: &SessionId) -> std::result::Result<bool, MemoryError>;

    /// Drop cached state for a session that will see no more appends.
    /// The stored record is kept.
    async fn release(&self, _id: &SessionId) {}
}

/// Shared search over a set of records, used by every store implementation.
pub fn search_records<'a>(
    records: impl IntoIterator<Item = &'a MemoryRecord>,
    query: &str,
    limit: usize,
) -> Vec<SearchHit> {
    let needle = query.to_lowercase();
    let mut hits: Vec<SearchHit> = records
        .into_iter()
        .flat_map(|record| {
            record
                .turns
                .iter()
                .filter(|turn| turn.content.to_lowercase().contains(&needle))
                .map(|turn| SearchHit {
                    session_id: record.session_id.clone(),
                    topic: record.topic.clone(),
                    turn: turn.clone(),
                })
        })
        .collect();

    hits.sort_by(|a, b| b.turn.timestamp.cmp(&a.turn.timestamp));
    hits.truncate(limit);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::OrderPolicy;

    fn record_with(turns: Vec<Turn>) -> MemoryRecord {
        let session = Session::new("What is virtue?", 2, vec!["socrates".into(), "plato".into()], OrderPolicy::Identity);
        let mut record = MemoryRecord::for_session(&session);
        record.turns = turns;
        record
    }

    #[test]
    fn record_serialization_has_documented_keys() {
        let record = record_with(vec![Turn::ok(1, 0, "socrates", "Define virtue.", vec![])]);
        let json = serde_json::to_value(&record).unwrap();
        for key in ["session_id", "topic", "created_at", "turns"] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["turns"][0]["speaker"], "socrates");
    }

    #[test]
    fn search_is_case_insensitive_and_limited() {
        let record = record_with(vec![
            Turn::ok(1, 0, "socrates", "Is VIRTUE knowledge?", vec![]),
            Turn::ok(1, 1, "plato", "Virtue is a form.", vec![]),
            Turn::ok(2, 0, "plato", "Nothing relevant.", vec![]),
        ]);
        let hits = search_records([&record], "virtue", 10);
        assert_eq!(hits.len(), 2);

        let limited = search_records([&record], "virtue", 1);
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn push_turn_rejects_out_of_order() {
        let mut record = record_with(vec![]);
        record.push_turn(Turn::ok(1, 0, "socrates", "a", vec![])).unwrap();
        record.push_turn(Turn::ok(1, 1, "plato", "b", vec![])).unwrap();
        assert!(record.push_turn(Turn::ok(1, 1, "plato", "again", vec![])).is_err());
        assert!(record.push_turn(Turn::ok(1, 0, "socrates", "earlier", vec![])).is_err());
        assert_eq!(record.turns.len(), 2);
    }

    #[test]
    fn summary_counts_turns() {
        let record = record_with(vec![Turn::ok(1, 0, "socrates", "x", vec![])]);
        assert_eq!(record.summary().turn_count, 1);
        assert_eq!(record.transcript().len(), 1);
    }
}
