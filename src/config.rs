use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::system::command::{COMMAND_TIMEOUT_KEY, DEFAULT_COMMAND_TIMEOUT};
use crate::system::history::DEFAULT_CAPACITY;
use crate::system::sampler::{
    CommandSet, DEFAULT_INTERVAL_MS, HISTORY_CAPACITY_KEY, INTERVAL_KEY, Settings,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub commands: CommandsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub interval_ms: u64,
    pub history_capacity: usize,
    pub command_timeout_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            interval_ms: DEFAULT_INTERVAL_MS,
            history_capacity: DEFAULT_CAPACITY,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    pub cpu: String,
    pub memory_stats: String,
    pub memory_size: String,
    pub network: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        let defaults = CommandSet::default();
        CommandsConfig {
            cpu: defaults.cpu,
            memory_stats: defaults.memory_stats,
            memory_size: defaults.memory_size,
            network: defaults.network,
        }
    }
}

impl CommandsConfig {
    pub fn to_command_set(&self) -> CommandSet {
        CommandSet {
            cpu: self.cpu.clone(),
            memory_stats: self.memory_stats.clone(),
            memory_size: self.memory_size.clone(),
            network: self.network.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl Settings for Config {
    fn setting(&self, key: &str) -> Option<u64> {
        match key {
            INTERVAL_KEY => Some(self.general.interval_ms),
            HISTORY_CAPACITY_KEY => Some(self.general.history_capacity as u64),
            COMMAND_TIMEOUT_KEY => Some(self.general.command_timeout_ms),
            _ => None,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("menustat").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "invalid config; using defaults");
                Config::default()
            }
        },
        Err(_) => Config::default(),
    }
}
