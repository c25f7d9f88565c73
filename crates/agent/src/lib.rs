//! The debate engine: agents, turn order and the orchestrator.
//!
//! A debate follows a fixed sequence:
//!
//! 1. **Validate** the request against the configured personas
//! 2. **Initialize** the shared model backend (fatal on failure)
//! 3. **For each round**: order the roster, then let each agent respond
//!    with the full transcript so far, persisting every turn
//! 4. **Summarize** (optional): the summarizer persona reads the whole
//!    transcript and adds one closing turn
//!
//! Per-turn failures never abort a run; they are recorded as failed turns.

pub mod agent;
pub mod api;
pub mod event;
pub mod order;
pub mod orchestrator;
pub mod retry;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use agent::{Agent, TurnContext, clean_response, format_history};
pub use api::{DebateAnswer, DebateApi, HistoryEntry};
pub use event::{DebateEvent, RunOutcome};
pub use order::TurnOrder;
pub use orchestrator::{DebateOutcome, DebateRequest, Orchestrator};
pub use retry::RetryPolicy;
