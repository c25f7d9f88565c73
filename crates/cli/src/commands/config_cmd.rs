//! `symposium config`: Configuration management commands.

use std::path::Path;
use symposium_config::{AppConfig, Settings};

use super::ConfigPaths;

fn write_default(path: &Path, content: &str, force: bool) -> Result<bool, Box<dyn std::error::Error>> {
    if path.exists() && !force {
        println!("  Kept existing {}", path.display());
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    println!("  Wrote {}", path.display());
    Ok(true)
}

pub async fn init(paths: &ConfigPaths, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("  Writing default configuration...");
    let wrote_settings = write_default(&paths.settings, &AppConfig::default_settings_toml(), force)?;
    let wrote_personas = write_default(&paths.personas, &AppConfig::default_personas_toml(), force)?;

    if !(wrote_settings || wrote_personas) {
        println!("  Nothing written; pass --force to overwrite.");
    }
    Ok(())
}

/// Settings with the API key masked, for display.
fn redacted(settings: &Settings) -> Settings {
    let mut shown = settings.clone();
    if shown.model.api_key.is_some() {
        shown.model.api_key = Some("********".into());
    }
    shown
}

pub async fn show(paths: &ConfigPaths) -> Result<(), Box<dyn std::error::Error>> {
    let config = paths.load()?;
    println!("{}", toml::to_string_pretty(&redacted(&config.settings))?);

    println!("# personas ({})", paths.personas.display());
    for persona in config.personas.iter() {
        let mut flags = Vec::new();
        if persona.can_use_tools() {
            flags.push("tools");
        }
        if persona.is_summarizer() {
            flags.push("summarizer");
        }
        println!(
            "#   {:<12} {:<12} temp={:.1} max_tokens={} {}",
            persona.id,
            persona.name,
            persona.temperature,
            persona.max_tokens,
            flags.join(",")
        );
    }
    Ok(())
}

pub async fn validate(paths: &ConfigPaths) -> Result<(), Box<dyn std::error::Error>> {
    println!("  Validating configuration...");

    match AppConfig::load_from(&paths.settings, &paths.personas) {
        Ok(config) => {
            println!("  ✅ Settings and personas are valid");
            println!();
            println!("  Backend:   {}", config.settings.model.backend);
            println!("  Model:     {}", config.settings.model.name);
            println!("  Rounds:    {}", config.settings.rounds);
            println!("  Roster:    {}", config.roster().join(", "));
            println!(
                "  Summary:   {}",
                config.personas.summarizer().map(|p| p.id.as_str()).unwrap_or("(none)")
            );
            println!("  Memory:    {}", if config.settings.memory.persist {
                config.settings.memory.path.display().to_string()
            } else {
                "in memory only".to_string()
            });
        }
        Err(e) => {
            println!("  ❌ Config error: {e}");
            return Err(e.into());
        }
    }
    Ok(())
}
