//! # Symposium Core
//!
//! Domain types, traits, and error definitions for the Symposium debate engine.
//! This crate has **no framework dependencies**: it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every swappable subsystem (model backend, transcript store) is defined as a
//! trait here. Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod backend;
pub mod error;
pub mod memory;
pub mod persona;
pub mod session;
pub mod tool;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use backend::{GenerateOptions, ModelBackend};
pub use error::{BackendError, Error, MemoryError, Result, ToolError};
pub use memory::{MemoryRecord, SearchHit, SessionSummary, TranscriptStore};
pub use persona::{CapabilityFlags, Persona};
pub use session::{OrderPolicy, Session, SessionId};
pub use tool::{ToolInvocation, ToolKind, ToolRequest};
pub use turn::{Transcript, Turn, TurnStatus};
