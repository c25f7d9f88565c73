//! Shared test helpers for agent and orchestrator tests.

use async_trait::async_trait;
use std::sync::Mutex;
use symposium_core::backend::{GenerateOptions, ModelBackend};
use symposium_core::error::BackendError;

/// A mock backend that returns a sequence of scripted results.
///
/// Each call to `generate` returns the next result in the queue. Once the
/// script runs out, every further call gets `fallback` (or panics if none
/// was given). Every prompt is recorded.
pub struct SequentialMockBackend {
    responses: Mutex<Vec<Result<String, BackendError>>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl SequentialMockBackend {
    pub fn new(responses: Vec<Result<String, BackendError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A backend that answers every call with `text`.
    pub fn always(text: &str) -> Self {
        Self::new(vec![]).with_fallback(text)
    }

    pub fn with_fallback(mut self, text: &str) -> Self {
        self.fallback = Some(text.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for SequentialMockBackend {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<String, BackendError> {
        let count = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };

        let responses = self.responses.lock().unwrap();
        match (responses.get(count), &self.fallback) {
            (Some(result), _) => result.clone(),
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => panic!(
                "SequentialMockBackend: no more responses (call #{}, have {})",
                count,
                responses.len()
            ),
        }
    }
}

/// A backend that always fails with a network error.
pub struct FailingBackend;

#[async_trait]
impl ModelBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String, BackendError> {
        Err(BackendError::Network("connection refused".into()))
    }
}
