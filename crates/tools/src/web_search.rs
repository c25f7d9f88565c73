//! Web search: short text snippets from an external lookup provider.
//!
//! The default provider is the DuckDuckGo Instant Answer API. It needs no
//! key and returns an abstract, related topics and a definition, which are
//! flattened into a handful of plain-text snippets.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use symposium_config::SearchConfig;
use symposium_core::error::ToolError;
use tracing::{debug, warn};

pub const DUCKDUCKGO_URL: &str = "https://api.duckduckgo.com/";

/// A source of search snippets.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// At most `max_results` snippets for `query`.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, ToolError>;
}

/// Build the provider named by `tools.search.provider`.
pub fn provider_from_config(config: &SearchConfig) -> Result<Arc<dyn SearchProvider>, ToolError> {
    match config.provider.as_str() {
        "duckduckgo" => Ok(Arc::new(DuckDuckGo::new(
            DUCKDUCKGO_URL,
            Duration::from_secs(config.timeout_secs),
        ))),
        "none" => Ok(Arc::new(DisabledSearch)),
        other => Err(ToolError::Unavailable(format!("unknown search provider '{other}'"))),
    }
}

/// DuckDuckGo Instant Answer API.
pub struct DuckDuckGo {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl DuckDuckGo {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into(),
            timeout_secs: timeout.as_secs(),
            client,
        }
    }

    fn error(&self, e: reqwest::Error) -> ToolError {
        if e.is_timeout() {
            ToolError::Timeout {
                tool_name: "search".into(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            ToolError::ExecutionFailed {
                tool_name: "search".into(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::Rejected("No query provided".into()));
        }

        debug!(provider = "duckduckgo", query, "Running search");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| self.error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Search provider returned error");
            return Err(ToolError::ExecutionFailed {
                tool_name: "search".into(),
                reason: format!("HTTP {status}"),
            });
        }

        let answer: InstantAnswer = response.json().await.map_err(|e| self.error(e))?;
        Ok(answer.snippets(max_results))
    }
}

/// The `none` provider: every search fails.
pub struct DisabledSearch;

#[async_trait]
impl SearchProvider for DisabledSearch {
    fn name(&self) -> &str {
        "none"
    }

    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<String>, ToolError> {
        Err(ToolError::Unavailable("search is disabled".into()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default, rename = "Abstract")]
    r#abstract: String,
    #[serde(default)]
    related_topics: Vec<serde_json::Value>,
    #[serde(default)]
    definition: String,
}

impl InstantAnswer {
    fn snippets(&self, max_results: usize) -> Vec<String> {
        let mut out = Vec::new();
        if !self.r#abstract.is_empty() {
            out.push(format!("Summary: {}", self.r#abstract));
        }
        // Grouped topics carry no `Text` of their own and are skipped
        out.extend(
            self.related_topics
                .iter()
                .filter_map(|t| t.get("Text").and_then(|v| v.as_str()))
                .filter(|s| !s.is_empty())
                .map(String::from),
        );
        if !self.definition.is_empty() {
            out.push(format!("Definition: {}", self.definition));
        }
        out.truncate(max_results);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(json: serde_json::Value) -> InstantAnswer {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn snippets_collect_all_sections() {
        let a = answer(serde_json::json!({
            "Abstract": "Rust is a language.",
            "RelatedTopics": [
                {"Text": "Rust (programming language)", "FirstURL": "https://x"},
                {"Name": "Group", "Topics": [{"Text": "nested"}]},
                {"Text": "Cargo"}
            ],
            "Definition": "An iron oxide."
        }));
        let snippets = a.snippets(10);
        assert_eq!(
            snippets,
            vec![
                "Summary: Rust is a language.",
                "Rust (programming language)",
                "Cargo",
                "Definition: An iron oxide.",
            ]
        );
    }

    #[test]
    fn snippets_are_capped() {
        let topics: Vec<_> = (0..20).map(|i| serde_json::json!({"Text": format!("t{i}")})).collect();
        let a = answer(serde_json::json!({"RelatedTopics": topics}));
        assert_eq!(a.snippets(5).len(), 5);
    }

    #[test]
    fn empty_answer_has_no_snippets() {
        let a = answer(serde_json::json!({"Abstract": "", "RelatedTopics": []}));
        assert!(a.snippets(5).is_empty());
    }

    #[test]
    fn provider_selection() {
        let mut config = SearchConfig::default();
        assert_eq!(provider_from_config(&config).unwrap().name(), "duckduckgo");
        config.provider = "none".into();
        assert_eq!(provider_from_config(&config).unwrap().name(), "none");
        config.provider = "bing".into();
        assert!(provider_from_config(&config).is_err());
    }

    #[tokio::test]
    async fn disabled_search_fails() {
        let err = DisabledSearch.search("anything", 5).await.unwrap_err();
        assert!(matches!(err, ToolError::Unavailable(_)));
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let ddg = DuckDuckGo::new("http://127.0.0.1:9/", Duration::from_secs(1));
        assert!(matches!(ddg.search("   ", 5).await, Err(ToolError::Rejected(_))));
    }

    #[tokio::test]
    async fn unreachable_provider_fails() {
        let ddg = DuckDuckGo::new("http://127.0.0.1:9/", Duration::from_secs(2));
        assert!(ddg.search("plato", 5).await.is_err());
    }
}
