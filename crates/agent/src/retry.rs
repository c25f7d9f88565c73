//! Bounded retry with exponential backoff for generation calls.

use std::time::Duration;
use symposium_config::RetryConfig;
use symposium_core::backend::GenerateOptions;
use symposium_core::error::BackendError;
use symposium_providers::SharedBackend;
use tracing::{debug, warn};

/// How many times a turn may call the backend, and how long to wait between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// A single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Attempts actually made; zero behaves like one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait after the `attempt`-th failure (1-based): doubling, capped.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Errors that another attempt cannot fix.
fn is_retryable(err: &BackendError) -> bool {
    !matches!(
        err,
        BackendError::Initialization(_) | BackendError::NotConfigured(_) | BackendError::ModelNotFound(_)
    )
}

/// Call the backend until it succeeds or the policy is exhausted.
pub async fn generate_with_retry(
    backend: &SharedBackend,
    prompt: &str,
    options: &GenerateOptions,
    policy: &RetryPolicy,
    speaker: &str,
) -> Result<String, BackendError> {
    let attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        match backend.generate(prompt, options).await {
            Ok(text) => {
                if attempt > 1 {
                    debug!(speaker, attempt, "Generation succeeded after retry");
                }
                return Ok(text);
            }
            Err(e) if attempt < attempts && is_retryable(&e) => {
                let wait = policy.backoff_for(attempt);
                warn!(speaker, attempt, max_attempts = attempts, error = %e, backoff_ms = wait.as_millis() as u64, "Generation failed, retrying");
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(speaker, attempt, error = %e, "Generation failed, giving up");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockBackend;
    use std::sync::Arc;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_millis(4000),
        }
    }

    fn network() -> BackendError {
        BackendError::Network("connection refused".into())
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = policy(10);
        assert_eq!(p.backoff_for(1), Duration::from_millis(250));
        assert_eq!(p.backoff_for(2), Duration::from_millis(500));
        assert_eq!(p.backoff_for(3), Duration::from_millis(1000));
        assert_eq!(p.backoff_for(6), Duration::from_millis(4000));
        assert_eq!(p.backoff_for(60), Duration::from_millis(4000));
    }

    #[test]
    fn zero_attempts_means_one() {
        assert_eq!(policy(0).attempts(), 1);
        assert_eq!(RetryPolicy::default().attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt() {
        let mock = Arc::new(SequentialMockBackend::new(vec![
            Err(network()),
            Err(BackendError::Timeout { timeout_secs: 60 }),
            Ok("Third time lucky.".into()),
        ]));
        let backend = SharedBackend::ready(mock.clone(), Duration::from_secs(60));

        let started = tokio::time::Instant::now();
        let out = generate_with_retry(&backend, "p", &GenerateOptions::default(), &policy(3), "socrates")
            .await
            .unwrap();
        assert_eq!(out, "Third time lucky.");
        assert_eq!(mock.call_count(), 3);
        // 250ms + 500ms of backoff
        assert_eq!(started.elapsed(), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_last_error() {
        let mock = Arc::new(SequentialMockBackend::new(vec![Err(network()), Err(network())]));
        let backend = SharedBackend::ready(mock.clone(), Duration::from_secs(60));

        let err = generate_with_retry(&backend, "p", &GenerateOptions::default(), &policy(2), "plato")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Network(_)));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unrecoverable_errors_are_not_retried() {
        let mock = Arc::new(SequentialMockBackend::new(vec![Err(BackendError::ModelNotFound(
            "llama9".into(),
        ))]));
        let backend = SharedBackend::ready(mock.clone(), Duration::from_secs(60));

        assert!(
            generate_with_retry(&backend, "p", &GenerateOptions::default(), &policy(5), "plato")
                .await
                .is_err()
        );
        assert_eq!(mock.call_count(), 1);
    }
}
