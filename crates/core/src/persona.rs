//! Persona value objects.
//!
//! Every agent runs the same turn pipeline; a persona is the only thing that
//! differs between them: its template and what it is allowed to do.

use serde::{Deserialize, Serialize};

use crate::backend::GenerateOptions;

/// What an agent is permitted to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
    /// May trigger tools (still subject to the global `tools.enabled`)
    #[serde(default)]
    pub can_use_tools: bool,

    /// Produces the closing synthesis instead of debating
    #[serde(default)]
    pub is_summarizer: bool,
}

/// A configured agent persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Roster identifier (e.g., "socrates")
    pub id: String,

    /// Display name used in prompts
    pub name: String,

    /// Instruction template; supports `{name}`, `{topic}`, `{round}`, `{rounds}`
    pub persona_template: String,

    #[serde(flatten)]
    pub capabilities: CapabilityFlags,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.8
}

fn default_max_tokens() -> u32 {
    256
}

impl Persona {
    /// A debating persona with default sampling options.
    pub fn new(id: impl Into<String>, template: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: title_case(&id),
            id,
            persona_template: template.into(),
            capabilities: CapabilityFlags::default(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }

    pub fn with_tools(mut self) -> Self {
        self.capabilities.can_use_tools = true;
        self
    }

    pub fn as_summarizer(mut self) -> Self {
        self.capabilities.is_summarizer = true;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn can_use_tools(&self) -> bool {
        self.capabilities.can_use_tools
    }

    pub fn is_summarizer(&self) -> bool {
        self.capabilities.is_summarizer
    }

    pub fn options(&self) -> GenerateOptions {
        GenerateOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// "socrates" → "Socrates", "devils_advocate" → "Devils Advocate".
pub fn title_case(id: &str) -> String {
    id.split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
