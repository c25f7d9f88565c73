//! The debate orchestrator: drives rounds, sequences agents, persists turns.
//!
//! A run moves through `Idle → RoundInProgress (× rounds) → RoundsComplete →
//! [Summarizing] → Done`. Turns are strictly sequential: each one is appended
//! to the store before the next agent is asked, so every agent sees the full
//! transcript so far.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use symposium_config::{AppConfig, PersonaSet, TriggerSource};
use symposium_core::error::{Error, Result};
use symposium_core::memory::TranscriptStore;
use symposium_core::persona::Persona;
use symposium_core::session::{OrderPolicy, Session};
use symposium_core::turn::{Transcript, Turn};
use symposium_providers::SharedBackend;
use symposium_tools::ToolRouter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::agent::{Agent, TurnContext};
use crate::event::{DebateEvent, RunOutcome};
use crate::order::TurnOrder;
use crate::retry::RetryPolicy;

/// What to debate and how.
#[derive(Debug, Clone, PartialEq)]
pub struct DebateRequest {
    pub topic: String,
    pub rounds: u32,
    /// Debating agents in roster order
    pub roster: Vec<String>,
    pub order: OrderPolicy,
    pub enable_summary: bool,
}

impl DebateRequest {
    pub fn new(topic: impl Into<String>, rounds: u32, roster: Vec<String>) -> Self {
        Self {
            topic: topic.into(),
            rounds,
            roster,
            order: OrderPolicy::default(),
            enable_summary: true,
        }
    }

    pub fn with_order(mut self, order: OrderPolicy) -> Self {
        self.order = order;
        self
    }

    pub fn with_summary(mut self, enable_summary: bool) -> Self {
        self.enable_summary = enable_summary;
        self
    }
}

/// The result of a run.
#[derive(Debug, Clone)]
pub struct DebateOutcome {
    pub session: Session,
    pub transcript: Transcript,
    /// Summary text, when a summary was requested and generated
    pub summary: Option<String>,
    pub outcome: RunOutcome,
    /// Set once the store failed; later turns were kept in memory only
    pub persistence_degraded: bool,
}

impl DebateOutcome {
    /// Turns from the debate rounds, without the summary turn.
    pub fn debate_turns(&self) -> impl Iterator<Item = &Turn> {
        let last_round = self.session.round_count;
        self.transcript.iter().filter(move |t| t.round_index <= last_round)
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcome == RunOutcome::Cancelled
    }
}

/// Drives debate sessions against one shared backend and one store.
pub struct Orchestrator {
    personas: PersonaSet,
    backend: Arc<SharedBackend>,
    store: Arc<dyn TranscriptStore>,
    tools: Option<Arc<ToolRouter>>,
    trigger_source: TriggerSource,
    retry: RetryPolicy,
    seed: Option<u64>,
    events: Option<mpsc::Sender<DebateEvent>>,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// An orchestrator with tools disabled and the default retry policy.
    pub fn new(personas: PersonaSet, backend: Arc<SharedBackend>, store: Arc<dyn TranscriptStore>) -> Self {
        Self {
            personas,
            backend,
            store,
            tools: None,
            trigger_source: TriggerSource::default(),
            retry: RetryPolicy::default(),
            seed: None,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Wire tools, retry and seed from loaded configuration.
    pub fn from_config(
        config: &AppConfig,
        backend: Arc<SharedBackend>,
        store: Arc<dyn TranscriptStore>,
    ) -> Result<Self> {
        let settings = &config.settings;
        let mut orchestrator = Self::new(config.personas.clone(), backend, store)
            .with_retry(RetryPolicy::from_config(&settings.retry))
            .with_seed(settings.orchestrator.seed);

        if settings.tools.enabled {
            let router = ToolRouter::from_config(&settings.tools).map_err(|e| Error::config(e.to_string()))?;
            orchestrator = orchestrator.with_tools(Arc::new(router), settings.tools.trigger_source);
        }

        Ok(orchestrator)
    }

    pub fn with_tools(mut self, router: Arc<ToolRouter>, source: TriggerSource) -> Self {
        self.tools = Some(router);
        self.trigger_source = source;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Seed for the shuffle order; `None` seeds from the OS.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_events(mut self, tx: mpsc::Sender<DebateEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that cancels runs at the next round or turn boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn personas(&self) -> &PersonaSet {
        &self.personas
    }

    pub fn store(&self) -> &Arc<dyn TranscriptStore> {
        &self.store
    }

    /// Run one debate to completion (or cancellation).
    ///
    /// Configuration and backend initialization failures abort before any
    /// turn. Everything after that is absorbed: failed generations become
    /// failed turns, and store failures degrade the session to memory only.
    pub async fn run(&self, request: DebateRequest) -> Result<DebateOutcome> {
        self.validate(&request)?;

        if let Err(e) = self.backend.initialize().await {
            error!(backend = %self.backend.label(), error = %e, "Backend initialization failed");
            return Err(e.into());
        }

        let agents: HashMap<&str, Agent> = request
            .roster
            .iter()
            .filter_map(|id| self.personas.get(id))
            .map(|persona| (persona.id.as_str(), self.agent_for(persona)))
            .collect();

        let session = Session::new(
            request.topic.trim(),
            request.rounds,
            request.roster.clone(),
            request.order,
        );
        info!(
            session_id = %session.id,
            rounds = session.round_count,
            roster = ?session.roster,
            order = %session.order_policy,
            summary = request.enable_summary,
            "Debate started"
        );

        let mut degraded = false;
        if let Err(e) = self.store.begin(&session).await {
            warn!(session_id = %session.id, store = self.store.name(), error = %e, "Could not register session; continuing in memory only");
            degraded = true;
        }

        self.emit(DebateEvent::Started {
            session_id: session.id.clone(),
            topic: session.topic.clone(),
            rounds: session.round_count,
            roster: session.roster.clone(),
        })
        .await;

        let mut transcript = Transcript::new();
        let mut order = TurnOrder::new(session.order_policy, self.seed);
        let mut outcome = RunOutcome::Completed;

        'rounds: for round in 1..=session.round_count {
            if self.cancel.is_cancelled() {
                outcome = RunOutcome::Cancelled;
                break;
            }

            let speakers = order.next_round(&session.roster);
            debug!(session_id = %session.id, round, order = ?speakers, "Round started");

            for (index, speaker) in speakers.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    outcome = RunOutcome::Cancelled;
                    break 'rounds;
                }

                let agent = agents
                    .get(speaker.as_str())
                    .ok_or_else(|| Error::Internal(format!("no agent for roster id '{speaker}'")))?;
                let ctx = TurnContext {
                    session: &session,
                    transcript: &transcript,
                    round_index: round,
                    turn_index: index as u32,
                };
                let turn = agent.respond(&ctx).await;

                self.append(&session, &mut transcript, turn.clone(), &mut degraded)
                    .await?;
                self.emit(DebateEvent::Turn { turn }).await;
            }
        }

        let mut summary = None;
        if request.enable_summary && outcome == RunOutcome::Completed {
            if self.cancel.is_cancelled() {
                outcome = RunOutcome::Cancelled;
            } else {
                let persona = self
                    .personas
                    .summarizer()
                    .ok_or_else(|| Error::config("no summarizer persona configured"))?;
                let agent = self.agent_for(persona);
                let ctx = TurnContext {
                    session: &session,
                    transcript: &transcript,
                    round_index: session.summary_round(),
                    turn_index: 0,
                };
                let turn = agent.respond(&ctx).await;
                if !turn.is_failed() {
                    summary = Some(turn.content.clone());
                }

                self.append(&session, &mut transcript, turn.clone(), &mut degraded)
                    .await?;
                self.emit(DebateEvent::Summary { turn }).await;
            }
        }

        let failed = transcript.iter().filter(|t| t.is_failed()).count();
        info!(
            session_id = %session.id,
            outcome = ?outcome,
            turns = transcript.len(),
            failed,
            persistence_degraded = degraded,
            "Debate finished"
        );
        self.store.release(&session.id).await;

        self.emit(DebateEvent::Completed {
            session_id: session.id.clone(),
            outcome,
            turns: transcript.len(),
        })
        .await;

        Ok(DebateOutcome {
            session,
            transcript,
            summary,
            outcome,
            persistence_degraded: degraded,
        })
    }

    /// Reject requests that cannot produce a well-formed transcript.
    pub fn validate(&self, request: &DebateRequest) -> Result<()> {
        if request.topic.trim().is_empty() {
            return Err(Error::config("topic must not be empty"));
        }
        if request.rounds == 0 {
            return Err(Error::config("rounds must be > 0"));
        }
        if request.roster.is_empty() {
            return Err(Error::config("roster must name at least one agent"));
        }

        let mut seen = HashSet::new();
        for id in &request.roster {
            if !seen.insert(id.as_str()) {
                return Err(Error::config(format!("agent '{id}' appears twice in the roster")));
            }
            match self.personas.get(id) {
                None => return Err(Error::config(format!("roster agent '{id}' has no persona"))),
                Some(p) if p.is_summarizer() => {
                    return Err(Error::config(format!(
                        "summarizer '{id}' cannot take part in the debate roster"
                    )));
                }
                Some(_) => {}
            }
        }

        if request.enable_summary && self.personas.summarizer().is_none() {
            return Err(Error::config("summary requested but no persona has is_summarizer = true"));
        }

        Ok(())
    }

    fn agent_for(&self, persona: &Persona) -> Agent {
        let agent = Agent::new(persona.clone(), self.backend.clone()).with_retry(self.retry.clone());
        match &self.tools {
            Some(router) => agent.with_tools(router.clone(), self.trigger_source),
            None => agent,
        }
    }

    /// Persist a turn (unless the session already degraded) and add it to
    /// the in-memory transcript.
    async fn append(
        &self,
        session: &Session,
        transcript: &mut Transcript,
        turn: Turn,
        degraded: &mut bool,
    ) -> Result<()> {
        if !*degraded {
            if let Err(e) = self.store.append(&session.id, turn.clone()).await {
                warn!(
                    session_id = %session.id,
                    store = self.store.name(),
                    error = %e,
                    "Persisting turn failed; continuing in memory only"
                );
                *degraded = true;
            }
        }
        transcript.push(turn)
    }

    async fn emit(&self, event: DebateEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).await.is_err() {
                debug!("Debate event receiver dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingBackend, SequentialMockBackend};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use symposium_config::default_personas;
    use symposium_core::backend::{GenerateOptions, ModelBackend};
    use symposium_core::error::{BackendError, MemoryError};
    use symposium_core::memory::{MemoryRecord, SearchHit, SessionSummary};
    use symposium_core::session::SessionId;
    use symposium_memory::in_memory::InMemoryStore;
    use symposium_tools::{Clock, DisabledSearch};

    fn roster() -> Vec<String> {
        vec!["socrates".into(), "plato".into(), "aristotle".into()]
    }

    fn shared(backend: Arc<dyn ModelBackend>) -> Arc<SharedBackend> {
        Arc::new(SharedBackend::ready(backend, Duration::from_secs(60)))
    }

    fn orchestrator(backend: Arc<dyn ModelBackend>, store: Arc<dyn TranscriptStore>) -> Orchestrator {
        Orchestrator::new(default_personas(), shared(backend), store).with_retry(RetryPolicy::none())
    }

    fn router() -> Arc<ToolRouter> {
        let clock = Clock::from_config(&Default::default()).unwrap();
        Arc::new(ToolRouter::new(Arc::new(DisabledSearch), clock, 3, Duration::from_secs(5)).unwrap())
    }

    fn speakers(turns: &[&Turn]) -> Vec<String> {
        turns.iter().map(|t| t.speaker.clone()).collect()
    }

    /// Store whose appends always fail.
    struct BrokenStore {
        appends: AtomicUsize,
        released: AtomicUsize,
    }

    #[async_trait]
    impl TranscriptStore for BrokenStore {
        fn name(&self) -> &str {
            "broken"
        }
        async fn begin(&self, _session: &Session) -> std::result::Result<(), MemoryError> {
            Ok(())
        }
        async fn load(&self, _id: &SessionId) -> std::result::Result<Option<Transcript>, MemoryError> {
            Ok(None)
        }
        async fn append(&self, _id: &SessionId, _turn: Turn) -> std::result::Result<(), MemoryError> {
            self.appends.fetch_add(1, Ordering::SeqCst);
            Err(MemoryError::Storage("disk full".into()))
        }
        async fn record(&self, _id: &SessionId) -> std::result::Result<Option<MemoryRecord>, MemoryError> {
            Ok(None)
        }
        async fn list(&self) -> std::result::Result<Vec<SessionSummary>, MemoryError> {
            Ok(vec![])
        }
        async fn search(&self, _q: &str, _limit: usize) -> std::result::Result<Vec<SearchHit>, MemoryError> {
            Ok(vec![])
        }
        async fn delete(&self, _id: &SessionId) -> std::result::Result<bool, MemoryError> {
            Ok(false)
        }
        async fn release(&self, _id: &SessionId) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Backend that cancels the token once it has answered `after` calls.
    struct CancellingBackend {
        token: CancellationToken,
        after: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelBackend for CancellingBackend {
        fn name(&self) -> &str {
            "cancelling"
        }

        async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> std::result::Result<String, BackendError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.after {
                self.token.cancel();
            }
            Ok(format!("reply {n}"))
        }
    }

    #[tokio::test]
    async fn transcript_length_matches_rounds_and_roster() {
        for (rounds, roster_len, summary) in [(1, 1, false), (3, 3, true), (2, 2, true), (4, 3, false)] {
            let store = Arc::new(InMemoryStore::new());
            let orch = orchestrator(Arc::new(SequentialMockBackend::always("A point.")), store);
            let roster: Vec<String> = roster().into_iter().take(roster_len).collect();

            let out = orch
                .run(DebateRequest::new("What is virtue?", rounds, roster).with_summary(summary))
                .await
                .unwrap();

            let expected = rounds as usize * roster_len + usize::from(summary);
            assert_eq!(out.transcript.len(), expected);
            assert_eq!(out.outcome, RunOutcome::Completed);
            assert_eq!(out.summary.is_some(), summary);
        }
    }

    #[tokio::test]
    async fn summary_turn_uses_reserved_round() {
        let orch = orchestrator(
            Arc::new(SequentialMockBackend::always("Summary: Both sides agree.")),
            Arc::new(InMemoryStore::new()),
        );
        let out = orch
            .run(DebateRequest::new("What is virtue?", 2, roster()))
            .await
            .unwrap();

        let last = out.transcript.last().unwrap();
        assert_eq!(last.round_index, 3);
        assert_eq!(last.turn_index, 0);
        assert_eq!(last.speaker, "summary");
        assert_eq!(out.summary.as_deref(), Some("Both sides agree."));
        assert_eq!(out.debate_turns().count(), 6);
    }

    #[tokio::test]
    async fn every_round_is_a_permutation_of_the_roster() {
        let orch = orchestrator(Arc::new(SequentialMockBackend::always("x")), Arc::new(InMemoryStore::new()))
            .with_seed(Some(11));
        let out = orch
            .run(DebateRequest::new("Justice?", 5, roster()).with_summary(false))
            .await
            .unwrap();

        let mut expected = roster();
        expected.sort();
        for round in 1..=5 {
            let turns: Vec<&Turn> = out.transcript.round(round).collect();
            let mut got = speakers(&turns);
            got.sort();
            assert_eq!(got, expected, "round {round}");
            let indices: Vec<u32> = turns.iter().map(|t| t.turn_index).collect();
            assert_eq!(indices, vec![0, 1, 2]);
        }
    }

    #[tokio::test]
    async fn same_seed_same_speaking_order() {
        let run = |seed| async move {
            let orch = orchestrator(Arc::new(SequentialMockBackend::always("x")), Arc::new(InMemoryStore::new()))
                .with_seed(Some(seed));
            let out = orch
                .run(DebateRequest::new("Justice?", 4, roster()).with_summary(false))
                .await
                .unwrap();
            out.transcript.iter().map(|t| t.speaker.clone()).collect::<Vec<_>>()
        };
        assert_eq!(run(99).await, run(99).await);
    }

    #[tokio::test]
    async fn identity_order_and_history_visibility() {
        let mock = Arc::new(SequentialMockBackend::new(vec![
            Ok("Socrates: What do you mean by justice?".into()),
            Ok("Justice is harmony of the soul.".into()),
        ]));
        let orch = orchestrator(mock.clone(), Arc::new(InMemoryStore::new()));
        let out = orch
            .run(
                DebateRequest::new("What is justice?", 1, vec!["socrates".into(), "plato".into()])
                    .with_order(OrderPolicy::Identity)
                    .with_summary(false),
            )
            .await
            .unwrap();

        let turns: Vec<&Turn> = out.transcript.iter().collect();
        assert_eq!(speakers(&turns), vec!["socrates", "plato"]);

        let prompts = mock.prompts();
        assert!(prompts[0].contains("(No prior conversation)"));
        assert!(prompts[1].contains("[socrates] What do you mean by justice?"));
    }

    #[tokio::test]
    async fn turns_are_persisted_in_order() {
        let store = Arc::new(InMemoryStore::new());
        let orch = orchestrator(Arc::new(SequentialMockBackend::always("x")), store.clone());
        let out = orch
            .run(DebateRequest::new("Is courage knowledge?", 2, roster()))
            .await
            .unwrap();

        let stored = store.load(&out.session.id).await.unwrap().unwrap();
        assert_eq!(stored, out.transcript);
        assert!(!out.persistence_degraded);
    }

    #[tokio::test]
    async fn tools_disabled_means_no_invocations() {
        let orch = orchestrator(Arc::new(SequentialMockBackend::always("x")), Arc::new(InMemoryStore::new()));
        let out = orch
            .run(DebateRequest::new("What is 2 + 2?", 2, roster()))
            .await
            .unwrap();
        assert!(out.transcript.iter().all(|t| t.tool_invocations.is_empty()));
    }

    #[tokio::test]
    async fn only_tool_capable_personas_invoke_tools() {
        let orch = orchestrator(Arc::new(SequentialMockBackend::always("x")), Arc::new(InMemoryStore::new()))
            .with_tools(router(), TriggerSource::Prompt);
        let out = orch
            .run(DebateRequest::new("What is 2 + 2?", 2, roster()))
            .await
            .unwrap();

        for turn in out.transcript.iter() {
            if turn.speaker == "aristotle" {
                assert_eq!(turn.tool_invocations.len(), 1);
                assert_eq!(turn.tool_invocations[0].value.as_deref(), Some("4"));
            } else {
                assert!(turn.tool_invocations.is_empty(), "{} used a tool", turn.speaker);
            }
        }
    }

    #[tokio::test]
    async fn failed_generations_become_failed_turns() {
        let orch = orchestrator(Arc::new(FailingBackend), Arc::new(InMemoryStore::new()));
        let out = orch
            .run(DebateRequest::new("What is virtue?", 2, roster()))
            .await
            .unwrap();

        assert_eq!(out.transcript.len(), 7);
        assert!(out.transcript.iter().all(|t| t.is_failed() && t.content.is_empty()));
        assert!(out.summary.is_none());
    }

    #[tokio::test]
    async fn store_failure_degrades_to_memory_only() {
        let store = Arc::new(BrokenStore {
            appends: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        });
        let orch = orchestrator(Arc::new(SequentialMockBackend::always("x")), store.clone());
        let out = orch
            .run(DebateRequest::new("What is virtue?", 2, roster()))
            .await
            .unwrap();

        assert!(out.persistence_degraded);
        assert_eq!(out.transcript.len(), 7);
        assert_eq!(store.appends.load(Ordering::SeqCst), 1);
        assert_eq!(store.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn init_failure_aborts_before_any_turn() {
        let backend = Arc::new(SharedBackend::new("broken", Duration::from_secs(5), || async {
            Err::<Arc<dyn ModelBackend>, _>(BackendError::ModelNotFound("missing.gguf".into()))
        }));
        let store = Arc::new(InMemoryStore::new());
        let orch = Orchestrator::new(default_personas(), backend, store.clone());

        let err = orch
            .run(DebateRequest::new("What is virtue?", 1, roster()))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_requests_are_config_errors() {
        let orch = orchestrator(Arc::new(SequentialMockBackend::always("x")), Arc::new(InMemoryStore::new()));
        let cases = [
            DebateRequest::new("   ", 1, roster()),
            DebateRequest::new("Virtue?", 0, roster()),
            DebateRequest::new("Virtue?", 1, vec![]),
            DebateRequest::new("Virtue?", 1, vec!["plato".into(), "plato".into()]),
            DebateRequest::new("Virtue?", 1, vec!["diogenes".into()]),
            DebateRequest::new("Virtue?", 1, vec!["summary".into()]),
        ];
        for request in cases {
            let err = orch.run(request.clone()).await.unwrap_err();
            assert!(matches!(err, Error::Config { .. }), "{request:?} gave {err}");
        }

        let no_summarizer = Orchestrator::new(
            PersonaSet::new(vec![Persona::new("socrates", "Question.")]),
            shared(Arc::new(SequentialMockBackend::always("x"))),
            Arc::new(InMemoryStore::new()),
        );
        let err = no_summarizer
            .run(DebateRequest::new("Virtue?", 1, vec!["socrates".into()]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn cancelled_before_start_produces_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let orch = orchestrator(Arc::new(SequentialMockBackend::always("x")), Arc::new(InMemoryStore::new()))
            .with_cancellation(token);

        let out = orch
            .run(DebateRequest::new("What is virtue?", 3, roster()))
            .await
            .unwrap();
        assert!(out.is_cancelled());
        assert!(out.transcript.is_empty());
        assert!(out.summary.is_none());
    }

    #[tokio::test]
    async fn cancellation_stops_at_turn_boundary() {
        let token = CancellationToken::new();
        let backend = Arc::new(CancellingBackend {
            token: token.clone(),
            after: 2,
            calls: AtomicUsize::new(0),
        });
        let orch = orchestrator(backend, Arc::new(InMemoryStore::new())).with_cancellation(token);

        let out = orch
            .run(DebateRequest::new("What is virtue?", 3, roster()))
            .await
            .unwrap();
        assert!(out.is_cancelled());
        // The in-flight turn completes; nothing after it starts
        assert_eq!(out.transcript.len(), 2);
        assert!(out.transcript.iter().all(|t| !t.is_failed()));
    }

    #[tokio::test]
    async fn events_follow_the_run() {
        let (tx, mut rx) = mpsc::channel(64);
        let orch = orchestrator(Arc::new(SequentialMockBackend::always("x")), Arc::new(InMemoryStore::new()))
            .with_events(tx);

        let out = orch
            .run(DebateRequest::new("What is virtue?", 1, roster()))
            .await
            .unwrap();
        drop(orch);

        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            kinds.push(event.event_type());
        }
        assert_eq!(kinds, vec!["started", "turn", "turn", "turn", "summary", "completed"]);
        assert_eq!(out.transcript.len(), 4);
    }
}
