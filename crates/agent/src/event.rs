//! Debate progress events.
//!
//! The orchestrator sends these over an `mpsc` channel as the run advances,
//! so a front end can render turns as they land instead of waiting for the
//! whole transcript.

use serde::{Deserialize, Serialize};
use symposium_core::session::SessionId;
use symposium_core::turn::Turn;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every round ran, plus the summary when requested
    Completed,
    /// Stopped at a round or turn boundary; the transcript is partial
    Cancelled,
}

/// Events emitted by the orchestrator during a run.
///
/// - `started`: session registered, before the first turn
/// - `turn`: a debate turn was appended
/// - `summary`: the closing summary turn was appended
/// - `completed`: the run is over
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebateEvent {
    Started {
        session_id: SessionId,
        topic: String,
        rounds: u32,
        roster: Vec<String>,
    },

    Turn { turn: Turn },

    Summary { turn: Turn },

    Completed {
        session_id: SessionId,
        outcome: RunOutcome,
        turns: usize,
    },
}

impl DebateEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Turn { .. } => "turn",
            Self::Summary { .. } => "summary",
            Self::Completed { .. } => "completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_turn() {
        let event = DebateEvent::Turn {
            turn: Turn::ok(1, 0, "socrates", "Know thyself.", vec![]),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"turn""#));
        assert!(json.contains(r#""speaker":"socrates""#));
    }

    #[test]
    fn event_serialization_completed() {
        let event = DebateEvent::Completed {
            session_id: SessionId::from("abc"),
            outcome: RunOutcome::Cancelled,
            turns: 4,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"completed""#));
        assert!(json.contains(r#""outcome":"cancelled""#));
        assert!(json.contains(r#""session_id":"abc""#));
    }

    #[test]
    fn event_type_names() {
        let started = DebateEvent::Started {
            session_id: SessionId::from("s"),
            topic: "t".into(),
            rounds: 1,
            roster: vec![],
        };
        assert_eq!(started.event_type(), "started");
        assert_eq!(
            DebateEvent::Summary {
                turn: Turn::failed(2, 0, "summary")
            }
            .event_type(),
            "summary"
        );
    }
}
