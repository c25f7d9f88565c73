//! Ollama backend: talks to a local Ollama daemon.
//!
//! Uses the native `/api/generate` endpoint with streaming disabled, so one
//! request yields one complete response.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use symposium_core::backend::{GenerateOptions, ModelBackend};
use symposium_core::error::BackendError;
use tracing::{debug, warn};

use crate::openai_compat::{status_error, transport_error};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// A backend backed by an Ollama daemon.
pub struct OllamaBackend {
    base_url: String,
    model: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(base_url: Option<&str>, model: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_OLLAMA_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.into(),
            timeout_secs: timeout.as_secs(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body(&self, prompt: &str, options: &GenerateOptions) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": options.temperature,
                "num_predict": options.max_tokens,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> std::result::Result<String, BackendError> {
        let url = format!("{}/api/generate", self.base_url);

        debug!(backend = "ollama", model = %self.model, "Sending generate request");

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(prompt, options))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Ollama returned error");
            return Err(status_error(status, error_body));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| BackendError::Api {
            status_code: 200,
            message: format!("Failed to parse response: {e}"),
        })?;

        Ok(parsed.response.trim().to_string())
    }

    fn is_reentrant(&self) -> bool {
        true
    }

    async fn health_check(&self) -> std::result::Result<bool, BackendError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url() {
        let backend = OllamaBackend::new(None, "llama3.2", Duration::from_secs(5));
        assert_eq!(backend.base_url(), "http://localhost:11434");
        assert_eq!(backend.name(), "ollama");

        let custom = OllamaBackend::new(Some("http://gpu-box:11434/"), "llama3.2", Duration::from_secs(5));
        assert_eq!(custom.base_url(), "http://gpu-box:11434");
    }

    #[test]
    fn request_body_shape() {
        let backend = OllamaBackend::new(None, "llama3.2", Duration::from_secs(5));
        let body = backend.request_body(
            "What is justice?",
            &GenerateOptions {
                temperature: 0.5,
                max_tokens: 128,
            },
        );
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["prompt"], "What is justice?");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 128);
    }

    #[test]
    fn parse_generate_response() {
        let data = r#"{"model":"llama3.2","response":" Justice is harmony. ","done":true}"#;
        let parsed: GenerateResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.response.trim(), "Justice is harmony.");
    }

    #[tokio::test]
    async fn unreachable_daemon_is_network_error() {
        let backend = OllamaBackend::new(Some("http://127.0.0.1:9"), "llama3.2", Duration::from_secs(2));
        let err = backend
            .generate("hi", &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::Network(_) | BackendError::Timeout { .. }
        ));
    }
}
