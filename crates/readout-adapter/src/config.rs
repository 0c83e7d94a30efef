//! Configuration loading

use anyhow::Result;
use readout_control::RegisterNames;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub adapter: AdapterConfig,
    #[serde(default)]
    pub registers: RegisterNames,
    #[serde(default)]
    pub bench: BenchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Health poll interval for `monitor`, in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Run reset + reactivate when a poll finds the link down
    #[serde(default)]
    pub auto_recover: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            auto_recover: false,
        }
    }
}

fn default_poll_interval() -> u64 {
    1000
}

/// Bench device setup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Initial register values, keyed by `name` or `block/name`
    #[serde(default)]
    pub presets: BTreeMap<String, u32>,
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}
