//! ModelBackend trait: the abstraction over inference engines.
//!
//! A backend knows how to turn one rendered prompt into generated text.
//!
//! Implementations: Ollama daemon, OpenAI-compatible endpoints, local Candle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Sampling options for a single generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.8
}

fn default_max_tokens() -> u32 {
    256
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// The core ModelBackend trait.
///
/// Every inference engine implements this trait. Agents call `generate()`
/// without knowing which engine is behind it.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// A human-readable name for this backend (e.g., "ollama", "local").
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> std::result::Result<String, BackendError>;

    /// Whether concurrent `generate` calls on one instance are safe.
    ///
    /// Non-reentrant backends are serialized by the shared backend handle.
    fn is_reentrant(&self) -> bool {
        false
    }

    /// Health check: can we reach the backend?
    async fn health_check(&self) -> std::result::Result<bool, BackendError> {
        Ok(true)
    }
}
