//! Model backend implementations for Symposium.
//!
//! All backends implement the `symposium_core::ModelBackend` trait.
//! The factory builds the configured one behind a process-wide shared handle.

pub mod factory;
#[cfg(feature = "local")]
pub mod local;
pub mod ollama;
pub mod openai_compat;

pub use factory::{SharedBackend, build_from_config};
#[cfg(feature = "local")]
pub use local::LocalBackend;
pub use ollama::OllamaBackend;
pub use openai_compat::OpenAiCompatBackend;
