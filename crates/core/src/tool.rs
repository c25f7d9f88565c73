//! Tool domain types: requests produced by the trigger heuristic and the
//! invocation records attached to turns.
//!
//! The router that produces and executes these lives in `symposium-tools`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The auxiliary lookups an agent may trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Search,
    Calculate,
    Time,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Calculate => "calculate",
            Self::Time => "time",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A tool call the trigger step decided to make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub kind: ToolKind,

    /// The query extracted from the inspected text
    pub query: String,
}

impl ToolRequest {
    pub fn new(kind: ToolKind, query: impl Into<String>) -> Self {
        Self {
            kind,
            query: query.into(),
        }
    }
}

/// The recorded outcome of executing a tool request.
///
/// Exactly one of `value` / `error` is set, matching `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: ToolKind,

    pub query: String,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall-clock time spent executing, in milliseconds
    #[serde(rename = "latency_ms", with = "duration_ms")]
    pub latency: Duration,
}

impl ToolInvocation {
    pub fn succeeded(request: &ToolRequest, value: impl Into<String>, latency: Duration) -> Self {
        Self {
            tool: request.kind,
            query: request.query.clone(),
            success: true,
            value: Some(value.into()),
            error: None,
            latency,
        }
    }

    pub fn failed(request: &ToolRequest, error: impl Into<String>, latency: Duration) -> Self {
        Self {
            tool: request.kind,
            query: request.query.clone(),
            success: false,
            value: None,
            error: Some(error.into()),
            latency,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_serializes_latency_as_millis() {
        let req = ToolRequest::new(ToolKind::Calculate, "2+2");
        let inv = ToolInvocation::succeeded(&req, "4", Duration::from_millis(12));
        let json = serde_json::to_value(&inv).unwrap();
        assert_eq!(json["latency_ms"], 12);
        assert_eq!(json["tool"], "calculate");
        assert!(json.get("error").is_none());

        let back: ToolInvocation = serde_json::from_value(json).unwrap();
        assert_eq!(back, inv);
    }

    #[test]
    fn failed_invocation_has_no_value() {
        let req = ToolRequest::new(ToolKind::Search, "plato");
        let inv = ToolInvocation::failed(&req, "timed out", Duration::ZERO);
        assert!(!inv.success);
        assert!(inv.value.is_none());
        assert_eq!(inv.error.as_deref(), Some("timed out"));
    }
}
