//! Symposium CLI: the main entry point.
//!
//! Commands:
//! - `debate`: Run one debate, or enter the interactive topic loop
//! - `memory`: List, show, search or clear stored transcripts
//! - `config`: Write, show or validate the configuration documents

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use symposium_config::{AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "symposium",
    about = "Symposium — multi-agent philosophical debate engine",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings document
    #[arg(short = 'c', long = "config", global = true, default_value = AppConfig::SETTINGS_PATH)]
    settings: PathBuf,

    /// Personas document
    #[arg(short = 'p', long, global = true, default_value = AppConfig::PERSONAS_PATH)]
    personas: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Debate a topic (interactive when no topic is given)
    Debate {
        /// The question to debate
        topic: Option<String>,

        /// Number of rounds
        #[arg(short, long)]
        rounds: Option<u32>,

        /// Add a closing summary
        #[arg(long, conflicts_with = "no_summary")]
        summary: bool,

        /// Skip the closing summary
        #[arg(long)]
        no_summary: bool,

        /// Let tool-capable personas use tools
        #[arg(long, conflicts_with = "no_tools")]
        tools: bool,

        /// Disable every tool
        #[arg(long)]
        no_tools: bool,

        /// Seed for the speaking order
        #[arg(long)]
        seed: Option<u64>,

        /// Print the finished debate as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage stored transcripts
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    /// List stored sessions, newest first
    List,

    /// Print one session's transcript
    Show {
        session_id: String,

        /// Print the stored record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search turn content across sessions
    Search {
        query: String,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Delete one session, or all of them with --confirm
    Clear {
        session_id: Option<String>,

        #[arg(long)]
        confirm: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write default settings and personas documents
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Check both documents
    Validate,
}

fn flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match &logging.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            let writer = std::sync::Mutex::new(file);
            if logging.json {
                builder.json().with_writer(writer).init();
            } else {
                builder.with_ansi(false).with_writer(writer).init();
            }
        }
        None if logging.json => builder.json().with_writer(std::io::stderr).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logging settings come from the settings document when it parses;
    // config errors themselves are reported by the command.
    let logging = AppConfig::load_settings(&cli.settings)
        .map(|s| s.logging)
        .unwrap_or_default();
    init_tracing(&logging, cli.verbose)?;
    tracing::debug!(
        settings = %cli.settings.display(),
        personas = %cli.personas.display(),
        "Configuration paths"
    );

    let paths = commands::ConfigPaths {
        settings: cli.settings,
        personas: cli.personas,
    };

    match cli.command {
        Commands::Debate {
            topic,
            rounds,
            summary,
            no_summary,
            tools,
            no_tools,
            seed,
            json,
        } => {
            let args = commands::debate::DebateArgs {
                topic,
                rounds,
                summary: flag(summary, no_summary),
                tools: flag(tools, no_tools),
                seed,
                json,
            };
            commands::debate::run(&paths, args).await?
        }
        Commands::Memory { action } => match action {
            MemoryAction::List => commands::memory::list(&paths).await?,
            MemoryAction::Show { session_id, json } => commands::memory::show(&paths, &session_id, json).await?,
            MemoryAction::Search { query, limit } => commands::memory::search(&paths, &query, limit).await?,
            MemoryAction::Clear { session_id, confirm } => {
                commands::memory::clear(&paths, session_id.as_deref(), confirm).await?
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config_cmd::init(&paths, force).await?,
            ConfigAction::Show => commands::config_cmd::show(&paths).await?,
            ConfigAction::Validate => commands::config_cmd::validate(&paths).await?,
        },
    }

    Ok(())
}
