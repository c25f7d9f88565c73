//! Turn and Transcript domain types.
//!
//! These are the value objects that flow through the whole engine:
//! Agent produces a Turn → Orchestrator appends it → Store persists it →
//! later agents read it back as context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::tool::ToolInvocation;

/// Outcome of a single turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    #[default]
    Ok,
    /// Every generation attempt failed; content is empty.
    Failed,
}

/// One agent's contribution within a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// 1-based round index (the summary uses `round_count + 1`)
    #[serde(rename = "round")]
    pub round_index: u32,

    /// 0-based position within the round
    #[serde(rename = "turn")]
    pub turn_index: u32,

    /// Roster id of the agent that spoke
    pub speaker: String,

    pub content: String,

    #[serde(rename = "tool_calls", default, skip_serializing_if = "Vec::is_empty")]
    pub tool_invocations: Vec<ToolInvocation>,

    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub status: TurnStatus,
}

impl Turn {
    /// A successful turn.
    pub fn ok(
        round_index: u32,
        turn_index: u32,
        speaker: impl Into<String>,
        content: impl Into<String>,
        tool_invocations: Vec<ToolInvocation>,
    ) -> Self {
        Self {
            round_index,
            turn_index,
            speaker: speaker.into(),
            content: content.into(),
            tool_invocations,
            timestamp: Utc::now(),
            status: TurnStatus::Ok,
        }
    }

    /// Placeholder recorded when every attempt for this turn failed.
    pub fn failed(round_index: u32, turn_index: u32, speaker: impl Into<String>) -> Self {
        Self {
            round_index,
            turn_index,
            speaker: speaker.into(),
            content: String::new(),
            tool_invocations: Vec::new(),
            timestamp: Utc::now(),
            status: TurnStatus::Failed,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == TurnStatus::Failed
    }

    fn position(&self) -> (u32, u32) {
        (self.round_index, self.turn_index)
    }
}

/// The append-only, order-preserving history of one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. Turns must be strictly increasing by
    /// `(round_index, turn_index)`.
    pub fn push(&mut self, turn: Turn) -> Result<(), Error> {
        if let Some(last) = self.turns.last() {
            if turn.position() <= last.position() {
                return Err(Error::Internal(format!(
                    "out-of-order turn: round {} turn {} after round {} turn {}",
                    turn.round_index, turn.turn_index, last.round_index, last.turn_index
                )));
            }
        }
        self.turns.push(turn);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Turns belonging to one round, in speaking order.
    pub fn round(&self, round_index: u32) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(move |t| t.round_index == round_index)
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }
}

impl TryFrom<Vec<Turn>> for Transcript {
    type Error = Error;

    fn try_from(turns: Vec<Turn>) -> Result<Self, Self::Error> {
        let mut transcript = Transcript::new();
        for turn in turns {
            transcript.push(turn)?;
        }
        Ok(transcript)
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
