//! Transcript store implementations for Symposium.

pub mod file_backend;
pub mod in_memory;

pub use file_backend::FileStore;
pub use in_memory::InMemoryStore;

use std::sync::Arc;
use symposium_config::MemoryConfig;
use symposium_core::memory::TranscriptStore;

/// Build the store selected by `[memory]`.
///
/// `persist = true` writes JSON documents under `memory.path`; otherwise
/// transcripts live only as long as the process.
pub fn build_from_config(config: &MemoryConfig) -> Arc<dyn TranscriptStore> {
    if config.persist {
        tracing::debug!(path = %config.path.display(), "Using file transcript store");
        Arc::new(FileStore::new(config.path.clone()))
    } else {
        Arc::new(InMemoryStore::new())
    }
}
