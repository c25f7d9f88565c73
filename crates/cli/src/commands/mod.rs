pub mod config_cmd;
pub mod debate;
pub mod memory;

use std::path::PathBuf;
use symposium_agent::DebateApi;
use symposium_config::AppConfig;

/// Where the two configuration documents live.
pub struct ConfigPaths {
    pub settings: PathBuf,
    pub personas: PathBuf,
}

impl ConfigPaths {
    pub fn load(&self) -> Result<AppConfig, Box<dyn std::error::Error>> {
        AppConfig::load_from(&self.settings, &self.personas)
            .map_err(|e| format!("Failed to load config: {e}").into())
    }

    pub fn api(&self) -> Result<DebateApi, Box<dyn std::error::Error>> {
        Ok(DebateApi::new(self.load()?))
    }
}
