//! Backend factory: builds the configured backend behind one shared handle.
//!
//! The handle initializes the backend lazily (at most once per process, even
//! under concurrent first use), serializes calls into non-reentrant engines,
//! and bounds every call with the configured timeout.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use symposium_config::{BackendKind, ModelConfig};
use symposium_core::backend::{GenerateOptions, ModelBackend};
use symposium_core::error::BackendError;
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

use crate::ollama::OllamaBackend;
use crate::openai_compat::{DEFAULT_OPENAI_URL, OpenAiCompatBackend};

type InitFuture = Pin<Box<dyn Future<Output = Result<Arc<dyn ModelBackend>, BackendError>> + Send>>;
type Initializer = Box<dyn Fn() -> InitFuture + Send + Sync>;

/// The single backend instance shared by every agent in a process.
pub struct SharedBackend {
    label: String,
    cell: OnceCell<Arc<dyn ModelBackend>>,
    init: Initializer,
    gate: Mutex<()>,
    timeout: Duration,
}

impl SharedBackend {
    /// A handle that runs `init` on first use.
    pub fn new<F, Fut>(label: impl Into<String>, timeout: Duration, init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn ModelBackend>, BackendError>> + Send + 'static,
    {
        Self {
            label: label.into(),
            cell: OnceCell::new(),
            init: Box::new(move || Box::pin(init())),
            gate: Mutex::new(()),
            timeout,
        }
    }

    /// A handle around an already constructed backend.
    pub fn ready(backend: Arc<dyn ModelBackend>, timeout: Duration) -> Self {
        let label = backend.name().to_string();
        Self {
            label,
            cell: OnceCell::new_with(Some(backend)),
            init: Box::new(|| {
                Box::pin(async {
                    Err(BackendError::Initialization("backend already provided".into()))
                })
            }),
            gate: Mutex::new(()),
            timeout,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Initialize the backend if needed and return it.
    ///
    /// Concurrent callers wait on the same initialization. A failed
    /// initialization is not cached; the next call tries again.
    pub async fn initialize(&self) -> Result<&Arc<dyn ModelBackend>, BackendError> {
        self.cell
            .get_or_try_init(|| async {
                info!(backend = %self.label, "Initializing model backend");
                (self.init)().await.map_err(|e| match e {
                    BackendError::Initialization(_) => e,
                    other => BackendError::Initialization(other.to_string()),
                })
            })
            .await
    }

    /// Generate with the shared backend, bounded by the configured timeout.
    pub async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, BackendError> {
        let backend = self.initialize().await?;

        let _guard = if backend.is_reentrant() {
            None
        } else {
            Some(self.gate.lock().await)
        };

        match tokio::time::timeout(self.timeout, backend.generate(prompt, options)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(backend = %self.label, timeout = ?self.timeout, "Generation timed out");
                Err(BackendError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        }
    }
}

/// Build the shared backend selected by `model.backend`.
pub fn build_from_config(model: &ModelConfig) -> SharedBackend {
    let timeout = Duration::from_secs(model.timeout_secs);
    let name = model.name.clone();
    let url = model.url.clone();

    match model.backend {
        BackendKind::Ollama => SharedBackend::new("ollama", timeout, move || {
            let backend: Arc<dyn ModelBackend> = Arc::new(OllamaBackend::new(url.as_deref(), name.clone(), timeout));
            async move { Ok(backend) }
        }),
        BackendKind::Openai => {
            let api_key = model.api_key.clone();
            SharedBackend::new("openai", timeout, move || {
                let result = openai_backend(url.as_deref(), &name, api_key.clone(), timeout);
                async move { result }
            })
        }
        BackendKind::Local => SharedBackend::new("local", timeout, move || local_backend(name.clone())),
    }
}

fn openai_backend(
    url: Option<&str>,
    name: &str,
    api_key: Option<String>,
    timeout: Duration,
) -> Result<Arc<dyn ModelBackend>, BackendError> {
    // Self-hosted endpoints often run without a key; the public API never does
    if url.is_none() && api_key.is_none() {
        return Err(BackendError::Initialization(
            "openai backend needs model.api_key (or SYMPOSIUM_API_KEY / OPENAI_API_KEY)".into(),
        ));
    }
    Ok(Arc::new(OpenAiCompatBackend::new(
        url.unwrap_or(DEFAULT_OPENAI_URL),
        name,
        api_key,
        timeout,
    )))
}

#[cfg(feature = "local")]
fn local_backend(name: String) -> impl Future<Output = Result<Arc<dyn ModelBackend>, BackendError>> + Send {
    async move {
        let backend = tokio::task::spawn_blocking(move || crate::local::LocalBackend::load(&name))
            .await
            .map_err(|e| BackendError::Initialization(format!("model loading task failed: {e}")))??;
        Ok(Arc::new(backend) as Arc<dyn ModelBackend>)
    }
}

#[cfg(not(feature = "local"))]
fn local_backend(_name: String) -> impl Future<Output = Result<Arc<dyn ModelBackend>, BackendError>> + Send {
    async {
        Err(BackendError::Initialization(
            "local backend unavailable: rebuild with `--features local`".into(),
        ))
    }
}
