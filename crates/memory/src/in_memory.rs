//! In-memory store: for tests and `memory.persist = false`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use symposium_core::error::MemoryError;
use symposium_core::memory::{MemoryRecord, SearchHit, SessionSummary, TranscriptStore, search_records};
use symposium_core::session::{Session, SessionId};
use symposium_core::turn::{Transcript, Turn};
use tokio::sync::RwLock;

/// A transcript store that keeps every record in a map.
pub struct InMemoryStore {
    records: Arc<RwLock<HashMap<SessionId, MemoryRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn begin(&self, session: &Session) -> Result<(), MemoryError> {
        self.records
            .write()
            .await
            .entry(session.id.clone())
            .or_insert_with(|| MemoryRecord::for_session(session));
        Ok(())
    }

    async fn load(&self, id: &SessionId) -> Result<Option<Transcript>, MemoryError> {
        Ok(self.records.read().await.get(id).map(MemoryRecord::transcript))
    }

    async fn append(&self, id: &SessionId, turn: Turn) -> Result<(), MemoryError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| MemoryError::UnknownSession(id.to_string()))?;
        record.push_turn(turn)
    }

    async fn record(&self, id: &SessionId) -> Result<Option<MemoryRecord>, MemoryError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, MemoryError> {
        let records = self.records.read().await;
        let mut summaries: Vec<SessionSummary> = records.values().map(MemoryRecord::summary).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, MemoryError> {
        let records = self.records.read().await;
        Ok(search_records(records.values(), query, limit))
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, MemoryError> {
        Ok(self.records.write().await.remove(id).is_some())
    }
}
