//! OpenAI-compatible backend implementation.
//!
//! Works with: OpenAI, OpenRouter, vLLM, LM Studio, llama.cpp server, and
//! any endpoint exposing `/chat/completions`.
//!
//! A rendered debate prompt is sent as a single user message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use symposium_core::backend::{GenerateOptions, ModelBackend};
use symposium_core::error::BackendError;
use tracing::{debug, warn};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// A backend speaking the OpenAI chat-completions protocol.
pub struct OpenAiCompatBackend {
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OpenAiCompatBackend {
    /// Create a new OpenAI-compatible backend.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            timeout_secs: timeout.as_secs(),
            client,
        }
    }

    /// The public OpenAI endpoint (convenience constructor).
    pub fn openai(model: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self::new(DEFAULT_OPENAI_URL, model, api_key, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body(&self, prompt: &str, options: &GenerateOptions) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [ApiMessage { role: "user".into(), content: Some(prompt.to_string()) }],
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
            "stream": false,
        })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Authorization", format!("Bearer {key}")),
            None => req,
        }
    }
}

/// Map a non-success status to the matching backend error.
pub(crate) fn status_error(status: u16, body: String) -> BackendError {
    match status {
        401 | 403 => BackendError::Api {
            status_code: status,
            message: "Invalid API key or insufficient permissions".into(),
        },
        404 => BackendError::ModelNotFound(body),
        429 => BackendError::Api {
            status_code: status,
            message: "Rate limited".into(),
        },
        _ => BackendError::Api {
            status_code: status,
            message: body,
        },
    }
}

/// Map a transport failure, keeping timeouts distinguishable.
pub(crate) fn transport_error(e: reqwest::Error, timeout_secs: u64) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout { timeout_secs }
    } else {
        BackendError::Network(e.to_string())
    }
}

#[async_trait]
impl ModelBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> std::result::Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(prompt, options);

        debug!(backend = "openai", model = %self.model, "Sending completion request");

        let response = self
            .authorize(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Backend returned error");
            return Err(status_error(status, error_body));
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| BackendError::Api {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        extract_content(api_response)
    }

    fn is_reentrant(&self) -> bool {
        true
    }

    async fn health_check(&self) -> std::result::Result<bool, BackendError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

fn extract_content(api_response: ApiResponse) -> Result<String, BackendError> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::Api {
            status_code: 200,
            message: "No choices in response".into(),
        })?;

    Ok(choice.message.content.unwrap_or_default())
}

// --- OpenAI API types ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}
