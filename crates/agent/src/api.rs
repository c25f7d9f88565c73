//! Programmatic entry point: ask a question, get the debate back.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use symposium_config::AppConfig;
use symposium_core::error::Result;
use symposium_core::memory::{SearchHit, TranscriptStore};
use symposium_core::session::SessionId;
use symposium_providers::SharedBackend;
use tracing::info;

use crate::orchestrator::{DebateOutcome, DebateRequest, Orchestrator};

/// One line of debate history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub speaker: String,
    pub content: String,
}

/// The answer to [`DebateApi::ask`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateAnswer {
    pub session_id: SessionId,
    /// Debate turns in speaking order (summary excluded)
    pub history: Vec<HistoryEntry>,
    pub summary: Option<String>,
}

impl From<&DebateOutcome> for DebateAnswer {
    fn from(outcome: &DebateOutcome) -> Self {
        Self {
            session_id: outcome.session.id.clone(),
            history: outcome
                .debate_turns()
                .map(|t| HistoryEntry {
                    speaker: t.speaker.clone(),
                    content: t.content.clone(),
                })
                .collect(),
            summary: outcome.summary.clone(),
        }
    }
}

/// Configured debate engine: one backend, one store, one persona set.
pub struct DebateApi {
    config: AppConfig,
    backend: Arc<SharedBackend>,
    store: Arc<dyn TranscriptStore>,
}

impl DebateApi {
    /// Build the backend and store selected by `config`. Nothing is
    /// initialized until the first debate runs.
    pub fn new(config: AppConfig) -> Self {
        let backend = Arc::new(symposium_providers::build_from_config(&config.settings.model));
        let store = symposium_memory::build_from_config(&config.settings.memory);
        Self { config, backend, store }
    }

    /// Load settings and personas from explicit paths.
    pub fn from_paths(settings: &Path, personas: &Path) -> Result<Self> {
        Ok(Self::new(AppConfig::load_from(settings, personas)?))
    }

    pub fn with_backend(mut self, backend: Arc<SharedBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn TranscriptStore>) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<SharedBackend> {
        &self.backend
    }

    /// The transcript store behind this engine.
    pub fn memory(&self) -> &Arc<dyn TranscriptStore> {
        &self.store
    }

    /// A request for `topic` using the configured rounds, roster, order
    /// and summary setting.
    pub fn session(&self, topic: impl Into<String>) -> DebateRequest {
        let settings = &self.config.settings;
        DebateRequest::new(topic, settings.rounds, self.config.roster())
            .with_order(settings.orchestrator.order)
            .with_summary(settings.orchestrator.enable_summary)
    }

    /// An orchestrator wired from configuration, for callers that want
    /// progress events or cancellation.
    pub fn orchestrator(&self) -> Result<Orchestrator> {
        Orchestrator::from_config(&self.config, self.backend.clone(), self.store.clone())
    }

    /// Run a debate. `None` falls back to the configured value.
    pub async fn ask(&self, topic: &str, rounds: Option<u32>, enable_summary: Option<bool>) -> Result<DebateAnswer> {
        let mut request = self.session(topic);
        if let Some(rounds) = rounds {
            request.rounds = rounds;
        }
        if let Some(enable_summary) = enable_summary {
            request.enable_summary = enable_summary;
        }

        let outcome = self.orchestrator()?.run(request).await?;
        Ok(DebateAnswer::from(&outcome))
    }

    /// Search stored transcripts.
    pub async fn search_memory(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        Ok(self.store.search(query, limit).await?)
    }

    /// Delete every stored session. Returns how many were removed.
    pub async fn clear_memory(&self) -> Result<usize> {
        let mut removed = 0;
        for summary in self.store.list().await? {
            if self.store.delete(&summary.session_id).await? {
                removed += 1;
            }
        }
        info!(removed, store = self.store.name(), "Cleared stored sessions");
        Ok(removed)
    }
}
