//! Configuration loading, validation, and management for Symposium.
//!
//! Two TOML documents drive a run:
//! - `settings.toml`: backend, rounds, tools, memory, retry, logging
//! - `personas.toml`: agent identifier → persona template and capabilities
//!
//! Environment variables override the backend selection. Everything is
//! validated at startup; a failure here aborts before any turn is produced.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use symposium_core::persona::{CapabilityFlags, Persona, title_case};

/// The settings document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Default number of debate rounds
    #[serde(default = "default_rounds")]
    pub rounds: u32,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_rounds() -> u32 {
    3
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            model: ModelConfig::default(),
            tools: ToolsConfig::default(),
            memory: MemoryConfig::default(),
            retry: RetryConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Which inference engine serves every agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Ollama daemon (`/api/generate`)
    #[default]
    Ollama,
    /// Any OpenAI-compatible `/chat/completions` endpoint
    Openai,
    /// In-process GGUF inference (requires the `local` feature)
    Local,
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "openai_compat" => Ok(Self::Openai),
            "local" => Ok(Self::Local),
            other => Err(ConfigError::ValidationError(format!(
                "unknown model.backend '{other}' (expected ollama, openai or local)"
            ))),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::Openai => write!(f, "openai"),
            Self::Local => write!(f, "local"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Model name, preset alias, or GGUF path for the local backend
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Override the daemon / endpoint base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Upper bound on a single generate call
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

fn default_model_name() -> String {
    "llama3.2".into()
}
fn default_model_timeout() -> u64 {
    60
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            name: default_model_name(),
            url: None,
            api_key: None,
            timeout_secs: default_model_timeout(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("backend", &self.backend)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Which text the tool trigger heuristic inspects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// The question section of the rendered prompt, before any generation
    #[default]
    Prompt,
    /// A first-pass draft; regenerate only when a tool fires
    Draft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Global switch; when false no turn ever carries tool invocations
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub trigger_source: TriggerSource,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub time: TimeConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_source: TriggerSource::default(),
            search: SearchConfig::default(),
            time: TimeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// "duckduckgo" or "none"
    #[serde(default = "default_search_provider")]
    pub provider: String,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_search_provider() -> String {
    "duckduckgo".into()
}
fn default_max_results() -> usize {
    5
}
fn default_search_timeout() -> u64 {
    10
}

pub const SEARCH_PROVIDERS: &[&str] = &["duckduckgo", "none"];

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// "local", "utc", or an IANA name such as "Europe/Athens"
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// strftime-style format for full timestamps
    #[serde(default = "default_time_format")]
    pub format: String,
}

fn default_timezone() -> String {
    "local".into()
}
fn default_time_format() -> String {
    "%Y-%m-%d %H:%M:%S".into()
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            format: default_time_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Write every turn to disk
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Directory holding one JSON record per session
    #[serde(default = "default_memory_path")]
    pub path: PathBuf,
}

fn default_memory_path() -> PathBuf {
    PathBuf::from("data/sessions")
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            persist: true,
            path: default_memory_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total generation attempts per turn (0 behaves like 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    250
}
fn default_max_backoff() -> u64 {
    4_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub order: symposium_core::OrderPolicy,

    /// Seed for the shuffle policy; unset means seeded from the OS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(default = "default_true")]
    pub enable_summary: bool,

    /// Debating agents in order; empty means every non-summarizer persona
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roster: Vec<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            order: symposium_core::OrderPolicy::default(),
            seed: None,
            enable_summary: true,
            roster: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write logs to this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            json: false,
        }
    }
}

/// One entry of the personas document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersonaEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    persona_template: String,

    #[serde(default)]
    can_use_tools: bool,

    #[serde(default)]
    is_summarizer: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl PersonaEntry {
    fn into_persona(self, id: &str) -> Persona {
        let mut persona = Persona::new(id, self.persona_template);
        persona.name = self.name.unwrap_or_else(|| title_case(id));
        persona.capabilities = CapabilityFlags {
            can_use_tools: self.can_use_tools,
            is_summarizer: self.is_summarizer,
        };
        if let Some(t) = self.temperature {
            persona.temperature = t;
        }
        if let Some(m) = self.max_tokens {
            persona.max_tokens = m;
        }
        persona
    }
}

/// The personas document, in file order.
#[derive(Debug, Clone, Default)]
pub struct PersonaSet {
    personas: Vec<Persona>,
}

impl PersonaSet {
    pub fn new(personas: Vec<Persona>) -> Self {
        Self { personas }
    }

    /// Parse a personas TOML document (`[personas.<id>]` tables).
    pub fn from_toml(content: &str) -> Result<Self, String> {
        let doc: toml::Table = toml::from_str(content).map_err(|e| e.to_string())?;
        let Some(table) = doc.get("personas") else {
            return Ok(Self::default());
        };
        let table = table
            .as_table()
            .ok_or_else(|| "`personas` must be a table".to_string())?;

        let mut personas = Vec::with_capacity(table.len());
        for (id, value) in table {
            let entry: PersonaEntry = value
                .clone()
                .try_into()
                .map_err(|e| format!("persona '{id}': {e}"))?;
            personas.push(entry.into_persona(id));
        }
        Ok(Self { personas })
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    /// The first persona flagged as summarizer.
    pub fn summarizer(&self) -> Option<&Persona> {
        self.personas.iter().find(|p| p.is_summarizer())
    }

    /// Every non-summarizer persona id, in document order.
    pub fn debaters(&self) -> Vec<String> {
        self.personas
            .iter()
            .filter(|p| !p.is_summarizer())
            .map(|p| p.id.clone())
            .collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for p in &self.personas {
            if p.persona_template.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "persona '{}' has an empty persona_template",
                    p.id
                )));
            }
            if p.is_summarizer() && p.can_use_tools() {
                return Err(ConfigError::ValidationError(format!(
                    "persona '{}' cannot be both a summarizer and a tool user",
                    p.id
                )));
            }
            if !(0.0..=2.0).contains(&p.temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "persona '{}' temperature must be between 0.0 and 2.0",
                    p.id
                )));
            }
        }
        Ok(())
    }
}

/// Both configuration documents, validated together.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: Settings,
    pub personas: PersonaSet,
}

impl AppConfig {
    /// Default settings path relative to the working directory.
    pub const SETTINGS_PATH: &'static str = "configs/settings.toml";
    /// Default personas path relative to the working directory.
    pub const PERSONAS_PATH: &'static str = "configs/personas.toml";

    /// Load from the default paths with environment overrides:
    /// - `SYMPOSIUM_BACKEND` overrides `model.backend`
    /// - `SYMPOSIUM_MODEL` overrides `model.name`
    /// - `SYMPOSIUM_API_KEY` / `OPENAI_API_KEY` fill `model.api_key` when unset
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(Self::SETTINGS_PATH), Path::new(Self::PERSONAS_PATH))
    }

    /// Load both documents from specific paths, then apply env overrides.
    pub fn load_from(settings_path: &Path, personas_path: &Path) -> Result<Self, ConfigError> {
        let mut settings = Self::load_settings(settings_path)?;
        apply_env_overrides(&mut settings)?;
        let personas = Self::load_personas(personas_path)?;

        let config = Self { settings, personas };
        config.validate()?;
        Ok(config)
    }

    /// Load the settings document. A missing file yields defaults.
    pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
        if !path.exists() {
            tracing::info!("No settings file found at {}, using defaults", path.display());
            return Ok(Settings::default());
        }

        let content = read(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load the personas document. A missing file yields the built-in cast.
    pub fn load_personas(path: &Path) -> Result<PersonaSet, ConfigError> {
        if !path.exists() {
            tracing::info!("No personas file found at {}, using built-in personas", path.display());
            return Ok(default_personas());
        }

        let content = read(path)?;
        PersonaSet::from_toml(&content).map_err(|reason| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Validate settings and personas together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.settings.validate()?;
        self.personas.validate()?;

        if self.personas.debaters().is_empty() {
            return Err(ConfigError::ValidationError(
                "personas document defines no debating agents".into(),
            ));
        }

        for id in &self.settings.orchestrator.roster {
            match self.personas.get(id) {
                None => {
                    return Err(ConfigError::ValidationError(format!(
                        "roster agent '{id}' has no persona"
                    )));
                }
                Some(p) if p.is_summarizer() => {
                    return Err(ConfigError::ValidationError(format!(
                        "summarizer '{id}' cannot take part in the debate roster"
                    )));
                }
                Some(_) => {}
            }
        }

        if self.settings.orchestrator.enable_summary && self.personas.summarizer().is_none() {
            return Err(ConfigError::ValidationError(
                "orchestrator.enable_summary is set but no persona has is_summarizer = true".into(),
            ));
        }

        Ok(())
    }

    /// The effective debate roster.
    pub fn roster(&self) -> Vec<String> {
        if self.settings.orchestrator.roster.is_empty() {
            self.personas.debaters()
        } else {
            self.settings.orchestrator.roster.clone()
        }
    }

    /// Default settings TOML (for `config init`).
    pub fn default_settings_toml() -> String {
        toml::to_string_pretty(&Settings::default()).unwrap_or_default()
    }

    /// Default personas TOML (for `config init`).
    pub fn default_personas_toml() -> String {
        DEFAULT_PERSONAS.trim_start().to_string()
    }
}

impl Settings {
    /// Validate the settings document on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rounds == 0 {
            return Err(ConfigError::ValidationError("rounds must be > 0".into()));
        }

        if self.model.name.trim().is_empty() {
            return Err(ConfigError::ValidationError("model.name must not be empty".into()));
        }

        if self.model.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "model.timeout_secs must be > 0".into(),
            ));
        }

        if !SEARCH_PROVIDERS.contains(&self.tools.search.provider.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown tools.search.provider '{}' (expected one of: {})",
                self.tools.search.provider,
                SEARCH_PROVIDERS.join(", ")
            )));
        }

        if self.tools.search.max_results == 0 {
            return Err(ConfigError::ValidationError(
                "tools.search.max_results must be > 0".into(),
            ));
        }

        validate_timezone(&self.tools.time.timezone)?;

        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::ValidationError(
                "retry.initial_backoff_ms must not exceed retry.max_backoff_ms".into(),
            ));
        }

        if self.memory.persist && self.memory.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "memory.path must be set when memory.persist is true".into(),
            ));
        }

        Ok(())
    }
}

fn validate_timezone(tz: &str) -> Result<(), ConfigError> {
    match tz.to_ascii_lowercase().as_str() {
        "local" | "utc" => Ok(()),
        _ => tz
            .parse::<chrono_tz::Tz>()
            .map(|_| ())
            .map_err(|_| ConfigError::ValidationError(format!("unknown timezone '{tz}'"))),
    }
}

fn apply_env_overrides(settings: &mut Settings) -> Result<(), ConfigError> {
    if let Ok(backend) = std::env::var("SYMPOSIUM_BACKEND") {
        settings.model.backend = backend.parse()?;
    }

    if let Ok(model) = std::env::var("SYMPOSIUM_MODEL") {
        settings.model.name = model;
    }

    if settings.model.api_key.is_none() {
        settings.model.api_key = std::env::var("SYMPOSIUM_API_KEY")
            .ok()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());
    }

    Ok(())
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

const DEFAULT_PERSONAS: &str = r#"
[personas.socrates]
name = "Socrates"
persona_template = "You are {name}. Question the assumptions behind '{topic}'."
can_use_tools = false

[personas.plato]
name = "Plato"
persona_template = "You are {name}. Relate '{topic}' to theory and ideal forms."
can_use_tools = false

[personas.aristotle]
name = "Aristotle"
persona_template = "You are {name}. Give one practical, actionable recommendation on '{topic}'. If you have tool results, use them directly."
can_use_tools = true

[personas.summary]
name = "Summary"
persona_template = "You are the moderator. Summarize the discussion of '{topic}' clearly, list 2-3 key takeaways, and note any open questions."
is_summarizer = true
max_tokens = 512
"#;

/// The built-in cast used when no personas file exists.
pub fn default_personas() -> PersonaSet {
    PersonaSet::from_toml(DEFAULT_PERSONAS).unwrap_or_default()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for symposium_core::Error {
    fn from(e: ConfigError) -> Self {
        symposium_core::Error::config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn app(settings: Settings) -> AppConfig {
        AppConfig {
            settings,
            personas: default_personas(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        let config = app(Settings::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.settings.rounds, 3);
        assert_eq!(config.settings.model.backend, BackendKind::Ollama);
        assert_eq!(config.settings.retry.max_attempts, 3);
    }

    #[test]
    fn default_personas_keep_document_order() {
        let personas = default_personas();
        assert_eq!(personas.len(), 4);
        assert_eq!(personas.debaters(), vec!["socrates", "plato", "aristotle"]);
        assert_eq!(personas.summarizer().unwrap().id, "summary");
        assert!(personas.get("aristotle").unwrap().can_use_tools());
        assert_eq!(personas.get("summary").unwrap().max_tokens, 512);
    }

    #[test]
    fn settings_roundtrip_toml() {
        let toml_str = AppConfig::default_settings_toml();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.rounds, 3);
        assert_eq!(parsed.tools.search.provider, "duckduckgo");
    }

    #[test]
    fn recognized_keys_parse() {
        let toml_str = r#"
rounds = 2

[model]
backend = "openai"
name = "gpt-4o-mini"

[tools]
enabled = false
trigger_source = "draft"

[tools.search]
provider = "none"

[memory]
persist = false
path = "/tmp/sessions"

[retry]
max_attempts = 5

[orchestrator]
order = "identity"
seed = 7
roster = ["plato", "socrates"]
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.rounds, 2);
        assert_eq!(settings.model.backend, BackendKind::Openai);
        assert!(!settings.tools.enabled);
        assert_eq!(settings.tools.trigger_source, TriggerSource::Draft);
        assert!(!settings.memory.persist);
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.orchestrator.seed, Some(7));

        let config = AppConfig {
            settings,
            personas: default_personas(),
        };
        config.validate().unwrap();
        assert_eq!(config.roster(), vec!["plato", "socrates"]);
    }

    #[test]
    fn zero_rounds_rejected() {
        let config = app(Settings {
            rounds: 0,
            ..Settings::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_backend_rejected() {
        let result: Result<Settings, _> = toml::from_str("[model]\nbackend = \"gpu-farm\"\n");
        assert!(result.is_err());
        assert!("gpu-farm".parse::<BackendKind>().is_err());
        assert_eq!("OLLAMA".parse::<BackendKind>().unwrap(), BackendKind::Ollama);
    }

    #[test]
    fn unknown_search_provider_rejected() {
        let mut settings = Settings::default();
        settings.tools.search.provider = "altavista".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn timezones_validated() {
        let mut settings = Settings::default();
        settings.tools.time.timezone = "Europe/Athens".into();
        assert!(settings.validate().is_ok());
        settings.tools.time.timezone = "Mars/Olympus".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn roster_must_reference_debating_personas() {
        let mut settings = Settings::default();
        settings.orchestrator.roster = vec!["socrates".into(), "diogenes".into()];
        assert!(app(settings.clone()).validate().is_err());

        settings.orchestrator.roster = vec!["socrates".into(), "summary".into()];
        assert!(app(settings).validate().is_err());
    }

    #[test]
    fn summary_requires_summarizer() {
        let personas = PersonaSet::new(vec![Persona::new("socrates", "Ask.")]);
        let mut config = AppConfig {
            settings: Settings::default(),
            personas,
        };
        assert!(config.validate().is_err());

        config.settings.orchestrator.enable_summary = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_files_return_defaults() {
        let config = AppConfig::load_from(
            Path::new("/nonexistent/settings.toml"),
            Path::new("/nonexistent/personas.toml"),
        )
        .unwrap();
        assert_eq!(config.personas.len(), 4);
        assert_eq!(config.settings.rounds, 3);
    }

    #[test]
    fn malformed_personas_file_is_parse_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[personas.socrates]\ncan_use_tools = true").unwrap();
        let err = AppConfig::load_personas(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("socrates"));
    }

    #[test]
    fn api_key_is_redacted() {
        let model = ModelConfig {
            api_key: Some("sk-secret".into()),
            ..ModelConfig::default()
        };
        let debug = format!("{model:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn config_error_converts_to_fatal_core_error() {
        let err: symposium_core::Error = ConfigError::ValidationError("bad".into()).into();
        assert!(err.is_fatal());
    }
}
