//! Tool router: decides whether a turn needs a tool, then runs it.
//!
//! The trigger step is a deterministic keyword/pattern classifier, checked in
//! this order:
//! 1. an arithmetic pattern (`digits op digits`) → calculate
//! 2. an explicit search phrase ("look up", "tell me about", ...) → search
//! 3. a time phrase ("today", "current", ...) → time
//! 4. text opening with a question word → search
//!
//! `execute` never fails: every outcome, including provider errors and
//! timeouts, comes back as a `ToolInvocation`.

use regex_lite::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use symposium_config::ToolsConfig;
use symposium_core::error::ToolError;
use symposium_core::tool::{ToolInvocation, ToolKind, ToolRequest};
use tracing::{debug, warn};

use crate::calculator;
use crate::clock::Clock;
use crate::web_search::{self, SearchProvider};

const MATH_PATTERN: &str = r"\d+\s*[+\-*/()]\s*\d+";
const MATH_RUN_PATTERN: &str = r"[\d.\s()+\-*/]+";
const SEARCH_PATTERN: &str = r"(?i)\b(search|look up|find|google|browse|research|information about|tell me about|find out|explain)\b";
const TIME_PATTERN: &str = r"(?i)\b(current|today|now|date|time)\b";
const QUESTION_PATTERN: &str = r"(?i)^\s*(what|who|where|when|why|how)\b";
const QUESTION_SENTENCE_PATTERN: &str = r"(?i)^(what|who|where|when|why|how|is|are|can)\b";
const SENTENCE_SPLIT_PATTERN: &str = r"[.!?]+";

/// Compiled trigger patterns.
#[derive(Debug, Clone)]
pub struct Classifier {
    math: Regex,
    math_run: Regex,
    search: Regex,
    time: Regex,
    question: Regex,
    question_sentence: Regex,
    sentence_split: Regex,
}

impl Classifier {
    pub fn new() -> Result<Self, ToolError> {
        let compile = |p: &str| {
            Regex::new(p).map_err(|e| ToolError::Unavailable(format!("bad trigger pattern: {e}")))
        };
        Ok(Self {
            math: compile(MATH_PATTERN)?,
            math_run: compile(MATH_RUN_PATTERN)?,
            search: compile(SEARCH_PATTERN)?,
            time: compile(TIME_PATTERN)?,
            question: compile(QUESTION_PATTERN)?,
            question_sentence: compile(QUESTION_SENTENCE_PATTERN)?,
            sentence_split: compile(SENTENCE_SPLIT_PATTERN)?,
        })
    }

    /// Classify `text`, extracting the query for the chosen tool.
    pub fn classify(&self, text: &str) -> Option<ToolRequest> {
        let kind = if self.math.is_match(text) {
            ToolKind::Calculate
        } else if self.search.is_match(text) {
            ToolKind::Search
        } else if self.time.is_match(text) {
            ToolKind::Time
        } else if self.question.is_match(text) {
            ToolKind::Search
        } else {
            return None;
        };

        let query = match kind {
            ToolKind::Calculate => self.arithmetic_query(text),
            ToolKind::Search => self.search_query(text),
            ToolKind::Time => time_query(text).to_string(),
        };
        Some(ToolRequest::new(kind, query))
    }

    /// The longest arithmetic run that contains an operator.
    fn arithmetic_query(&self, text: &str) -> String {
        self.math_run
            .find_iter(text)
            .map(|m| m.as_str().trim())
            .filter(|s| s.chars().any(|c| c.is_ascii_digit()) && s.contains(['+', '-', '*', '/']))
            .max_by_key(|s| s.len())
            .unwrap_or_else(|| text.trim())
            .to_string()
    }

    /// The first question sentence, else the last non-empty sentence.
    fn search_query(&self, text: &str) -> String {
        let sentences: Vec<&str> = self
            .sentence_split
            .split(text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        sentences
            .iter()
            .find(|s| self.question_sentence.is_match(s))
            .or_else(|| sentences.last())
            .map(|s| s.to_string())
            .unwrap_or_else(|| text.trim().to_string())
    }
}

fn time_query(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    if lower.contains("time") {
        "time"
    } else if lower.contains("date") || lower.contains("today") {
        "date"
    } else {
        "datetime"
    }
}

/// Classifies text and executes the three built-in tools.
pub struct ToolRouter {
    classifier: Classifier,
    search: Arc<dyn SearchProvider>,
    clock: Clock,
    max_results: usize,
    search_timeout: Duration,
}

impl ToolRouter {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        clock: Clock,
        max_results: usize,
        search_timeout: Duration,
    ) -> Result<Self, ToolError> {
        Ok(Self {
            classifier: Classifier::new()?,
            search,
            clock,
            max_results,
            search_timeout,
        })
    }

    /// Build the router from `[tools]` settings.
    pub fn from_config(config: &ToolsConfig) -> Result<Self, ToolError> {
        Self::new(
            web_search::provider_from_config(&config.search)?,
            Clock::from_config(&config.time)?,
            config.search.max_results,
            Duration::from_secs(config.search.timeout_secs),
        )
    }

    /// Decide whether `text` calls for a tool.
    pub fn trigger(&self, text: &str) -> Option<ToolRequest> {
        let request = self.classifier.classify(text);
        if let Some(req) = &request {
            debug!(tool = %req.kind, query = %req.query, "Tool triggered");
        }
        request
    }

    /// Run a request. Never fails; errors are captured in the invocation.
    pub async fn execute(&self, request: &ToolRequest) -> ToolInvocation {
        let started = Instant::now();
        let result = match request.kind {
            ToolKind::Calculate => calculator::evaluate(&request.query).map(calculator::format_number),
            ToolKind::Search => self.run_search(&request.query).await,
            ToolKind::Time => Ok(self.clock.now(&request.query)),
        };
        let latency = started.elapsed();

        match result {
            Ok(value) => {
                debug!(tool = %request.kind, latency_ms = latency.as_millis() as u64, "Tool succeeded");
                ToolInvocation::succeeded(request, value, latency)
            }
            Err(e) => {
                warn!(tool = %request.kind, error = %e, "Tool failed");
                ToolInvocation::failed(request, e.to_string(), latency)
            }
        }
    }

    async fn run_search(&self, query: &str) -> Result<String, ToolError> {
        let lookup = self.search.search(query, self.max_results);
        let snippets = tokio::time::timeout(self.search_timeout, lookup)
            .await
            .map_err(|_| ToolError::Timeout {
                tool_name: "search".into(),
                timeout_secs: self.search_timeout.as_secs(),
            })??;

        if snippets.is_empty() {
            Ok("No results found".into())
        } else {
            Ok(snippets.join("\n"))
        }
    }
}
