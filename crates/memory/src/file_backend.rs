//! File-based transcript store: one pretty-printed JSON document per session.
//!
//! Storage location: `{memory.path}/{session_id}.json`
//!
//! Every append rewrites the session's document through a sibling temp file
//! that is synced to disk before it is renamed over the old version.
//! Each session has its own lock; different sessions never block each other.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use symposium_core::error::MemoryError;
use symposium_core::memory::{MemoryRecord, SearchHit, SessionSummary, TranscriptStore, search_records};
use symposium_core::session::{Session, SessionId};
use symposium_core::turn::{Transcript, Turn};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

type RecordHandle = Arc<Mutex<MemoryRecord>>;

/// A file-backed transcript store.
pub struct FileStore {
    dir: PathBuf,
    sessions: RwLock<HashMap<SessionId, RecordHandle>>,
}

/// What was found on disk for one session.
enum Stored {
    Missing,
    Corrupt(String),
    Found(MemoryRecord),
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a session's document. Rejects ids that could escape `dir`.
    fn path_for(&self, id: &SessionId) -> Result<PathBuf, MemoryError> {
        let valid = !id.as_str().is_empty()
            && id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(MemoryError::UnknownSession(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", id.as_str())))
    }

    async fn read_stored(path: &Path) -> Stored {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Stored::Missing,
            Err(e) => return Stored::Corrupt(e.to_string()),
        };
        match serde_json::from_str::<MemoryRecord>(&content) {
            Ok(record) => Stored::Found(record),
            Err(e) => Stored::Corrupt(e.to_string()),
        }
    }

    /// Write `record` atomically: temp file in the same directory, synced,
    /// then renamed over the live document.
    async fn persist(&self, record: &MemoryRecord) -> Result<(), MemoryError> {
        let path = self.path_for(&record.session_id)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to create memory directory: {e}")))?;

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| MemoryError::Serialization(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        if let Err(e) = Self::write_synced(&tmp, json.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(MemoryError::Storage(format!("Failed to write {}: {e}", tmp.display())));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(MemoryError::Storage(format!("Failed to replace {}: {e}", path.display())));
        }
        self.sync_dir().await;

        debug!(path = %path.display(), turns = record.turns.len(), "Session record written");
        Ok(())
    }

    async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await
    }

    /// Flush the directory entry for the rename. Not every platform can open
    /// a directory, so failures are only logged.
    async fn sync_dir(&self) {
        let synced = match tokio::fs::File::open(&self.dir).await {
            Ok(dir) => dir.sync_all().await,
            Err(e) => Err(e),
        };
        if let Err(e) = synced {
            debug!(dir = %self.dir.display(), error = %e, "Directory sync skipped");
        }
    }

    /// The live handle for a session, loading it from disk if needed.
    async fn handle(&self, id: &SessionId) -> Result<Option<RecordHandle>, MemoryError> {
        if let Some(h) = self.sessions.read().await.get(id) {
            return Ok(Some(h.clone()));
        }

        let path = self.path_for(id)?;
        match Self::read_stored(&path).await {
            Stored::Found(record) => {
                let mut sessions = self.sessions.write().await;
                let h = sessions
                    .entry(id.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(record)))
                    .clone();
                Ok(Some(h))
            }
            Stored::Corrupt(reason) => {
                warn!(path = %path.display(), %reason, "Unreadable session record");
                Ok(None)
            }
            Stored::Missing => Ok(None),
        }
    }

    /// Every record on disk, with in-flight sessions taking precedence.
    async fn all_records(&self) -> Result<Vec<MemoryRecord>, MemoryError> {
        let mut by_id: HashMap<SessionId, MemoryRecord> = HashMap::new();

        match tokio::fs::read_dir(&self.dir).await {
            Ok(mut entries) => {
                while let Some(entry) = entries
                    .next_entry()
                    .await
                    .map_err(|e| MemoryError::Storage(e.to_string()))?
                {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("json") {
                        continue;
                    }
                    match Self::read_stored(&path).await {
                        Stored::Found(record) => {
                            by_id.insert(record.session_id.clone(), record);
                        }
                        Stored::Corrupt(reason) => {
                            warn!(path = %path.display(), %reason, "Skipping unreadable session record");
                        }
                        Stored::Missing => {}
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(MemoryError::Storage(e.to_string())),
        }

        let handles: Vec<RecordHandle> = self.sessions.read().await.values().cloned().collect();
        for h in handles {
            let record = h.lock().await.clone();
            by_id.insert(record.session_id.clone(), record);
        }

        Ok(by_id.into_values().collect())
    }
}

#[async_trait]
impl TranscriptStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn begin(&self, session: &Session) -> Result<(), MemoryError> {
        let path = self.path_for(&session.id)?;
        if self.sessions.read().await.contains_key(&session.id) {
            return Ok(());
        }

        let record = match Self::read_stored(&path).await {
            Stored::Found(existing) => existing,
            Stored::Corrupt(reason) => {
                warn!(path = %path.display(), %reason, "Corrupt session record, starting fresh");
                MemoryRecord::for_session(session)
            }
            Stored::Missing => MemoryRecord::for_session(session),
        };

        self.persist(&record).await?;
        self.sessions
            .write()
            .await
            .entry(session.id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(record)));
        Ok(())
    }

    async fn load(&self, id: &SessionId) -> Result<Option<Transcript>, MemoryError> {
        if let Some(h) = self.sessions.read().await.get(id) {
            return Ok(Some(h.lock().await.transcript()));
        }

        let path = self.path_for(id)?;
        match Self::read_stored(&path).await {
            Stored::Found(record) => Ok(Some(record.transcript())),
            Stored::Corrupt(reason) => {
                warn!(path = %path.display(), %reason, "Unreadable session record, returning empty transcript");
                Ok(Some(Transcript::new()))
            }
            Stored::Missing => Ok(None),
        }
    }

    async fn append(&self, id: &SessionId, turn: Turn) -> Result<(), MemoryError> {
        let handle = self
            .handle(id)
            .await?
            .ok_or_else(|| MemoryError::UnknownSession(id.to_string()))?;

        let mut record = handle.lock().await;
        let mut next = record.clone();
        next.push_turn(turn)?;
        self.persist(&next).await?;
        *record = next;
        Ok(())
    }

    async fn record(&self, id: &SessionId) -> Result<Option<MemoryRecord>, MemoryError> {
        match self.handle(id).await? {
            Some(h) => Ok(Some(h.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, MemoryError> {
        let mut summaries: Vec<SessionSummary> =
            self.all_records().await?.iter().map(MemoryRecord::summary).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, MemoryError> {
        let records = self.all_records().await?;
        Ok(search_records(&records, query, limit))
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, MemoryError> {
        let path = self.path_for(id)?;
        let in_memory = self.sessions.write().await.remove(id).is_some();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(in_memory),
            Err(e) => Err(MemoryError::Storage(format!("Failed to delete {}: {e}", path.display()))),
        }
    }

    async fn release(&self, id: &SessionId) {
        if self.sessions.write().await.remove(id).is_some() {
            debug!(session_id = %id, "Session handle released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symposium_core::session::OrderPolicy;
    use symposium_core::tool::{ToolInvocation, ToolKind, ToolRequest};
    use tempfile::TempDir;

    fn session(topic: &str) -> Session {
        Session::new(topic, 2, vec!["socrates".into(), "plato".into()], OrderPolicy::Identity)
    }

    fn turns() -> Vec<Turn> {
        let req = ToolRequest::new(ToolKind::Calculate, "2+2");
        vec![
            Turn::ok(1, 0, "socrates", "What is the good?", vec![]),
            Turn::ok(
                1,
                1,
                "plato",
                "The form of the good.",
                vec![ToolInvocation::succeeded(&req, "4", std::time::Duration::from_millis(3))],
            ),
            Turn::failed(2, 0, "socrates"),
            Turn::ok(2, 1, "plato", "It illuminates all.", vec![]),
        ]
    }

    #[tokio::test]
    async fn round_trip_across_instances() {
        let tmp = TempDir::new().unwrap();
        let s = session("The good");
        let expected = turns();

        let store = FileStore::new(tmp.path());
        store.begin(&s).await.unwrap();
        for t in expected.clone() {
            store.append(&s.id, t).await.unwrap();
        }

        // Fresh instance: read back from disk only
        let reopened = FileStore::new(tmp.path());
        let transcript = reopened.load(&s.id).await.unwrap().unwrap();
        assert_eq!(transcript.turns(), expected.as_slice());

        let record = reopened.record(&s.id).await.unwrap().unwrap();
        assert_eq!(record.topic, "The good");
        assert_eq!(record.rounds, 2);
    }

    #[tokio::test]
    async fn document_layout() {
        let tmp = TempDir::new().unwrap();
        let s = session("Layout");
        let store = FileStore::new(tmp.path());
        store.begin(&s).await.unwrap();
        store.append(&s.id, turns().remove(0)).await.unwrap();

        let path = tmp.path().join(format!("{}.json", s.id));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["session_id"], s.id.as_str());
        assert_eq!(json["turns"][0]["round"], 1);
        assert_eq!(json["turns"][0]["turn"], 0);
        assert_eq!(json["turns"][0]["status"], "ok");

        // No temp files left behind
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn corrupt_record_yields_empty_transcript() {
        let tmp = TempDir::new().unwrap();
        let s = session("Corrupt");
        std::fs::write(tmp.path().join(format!("{}.json", s.id)), "{ not json").unwrap();

        let store = FileStore::new(tmp.path());
        let transcript = store.load(&s.id).await.unwrap().unwrap();
        assert!(transcript.is_empty());

        // The session proceeds with a fresh record
        store.begin(&s).await.unwrap();
        store.append(&s.id, turns().remove(0)).await.unwrap();
        assert_eq!(store.load(&s.id).await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_session_is_absent() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("not-yet-created"));
        let id = SessionId::from("nope");
        assert!(store.load(&id).await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
        assert!(matches!(
            store.append(&id, turns().remove(0)).await,
            Err(MemoryError::UnknownSession(_))
        ));
    }

    #[tokio::test]
    async fn path_traversal_ids_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        assert!(store.load(&SessionId::from("../etc/passwd")).await.is_err());
    }

    #[tokio::test]
    async fn out_of_order_append_is_rejected_and_not_written() {
        let tmp = TempDir::new().unwrap();
        let s = session("Order");
        let store = FileStore::new(tmp.path());
        store.begin(&s).await.unwrap();
        store.append(&s.id, Turn::ok(1, 1, "plato", "second", vec![])).await.unwrap();
        assert!(store.append(&s.id, Turn::ok(1, 0, "socrates", "first", vec![])).await.is_err());

        let reopened = FileStore::new(tmp.path());
        assert_eq!(reopened.load(&s.id).await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_sessions_are_independent() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(FileStore::new(tmp.path()));

        let mut tasks = Vec::new();
        for n in 0..4 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let s = session(&format!("topic {n}"));
                store.begin(&s).await.unwrap();
                for t in turns() {
                    store.append(&s.id, t).await.unwrap();
                }
                s.id
            }));
        }

        let mut ids = Vec::new();
        for t in tasks {
            ids.push(t.await.unwrap());
        }

        let reopened = FileStore::new(tmp.path());
        for id in &ids {
            assert_eq!(reopened.load(id).await.unwrap().unwrap().len(), 4);
        }
        assert_eq!(reopened.list().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn search_and_delete() {
        let tmp = TempDir::new().unwrap();
        let s = session("Search");
        let store = FileStore::new(tmp.path());
        store.begin(&s).await.unwrap();
        for t in turns() {
            store.append(&s.id, t).await.unwrap();
        }

        let hits = FileStore::new(tmp.path()).search("form of the", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].turn.speaker, "plato");

        assert!(store.delete(&s.id).await.unwrap());
        assert!(store.load(&s.id).await.unwrap().is_none());
        assert!(!store.delete(&s.id).await.unwrap());
        assert!(store.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn release_drops_handle_and_keeps_record() {
        let tmp = TempDir::new().unwrap();
        let s = session("Release");
        let store = FileStore::new(tmp.path());
        store.begin(&s).await.unwrap();
        store.append(&s.id, turns().remove(0)).await.unwrap();
        assert_eq!(store.sessions.read().await.len(), 1);

        store.release(&s.id).await;
        assert!(store.sessions.read().await.is_empty());
        assert_eq!(store.load(&s.id).await.unwrap().unwrap().len(), 1);

        // A late append reloads the record from disk
        store.append(&s.id, turns().remove(1)).await.unwrap();
        assert_eq!(FileStore::new(tmp.path()).load(&s.id).await.unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_replace_reports_error_and_removes_temp_file() {
        let tmp = TempDir::new().unwrap();
        let s = session("Blocked");
        // A non-empty directory where the document should go makes the rename fail
        let target = tmp.path().join(format!("{}.json", s.id));
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("occupied"), "x").unwrap();

        let store = FileStore::new(tmp.path());
        assert!(matches!(store.begin(&s).await, Err(MemoryError::Storage(_))));
        assert!(!tmp.path().join(format!("{}.json.tmp", s.id)).exists());
    }
}
