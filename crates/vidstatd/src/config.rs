//! Configuration for vidstatd.
//!
//! Loads settings from /etc/vidstat/config.toml or uses defaults, with
//! environment overrides for the deployment knobs. Config is read once
//! at startup and injected as an immutable value; there is no
//! process-wide mutable configuration state.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::llm::DEFAULT_TIMEOUT_SECS;
use crate::store::DB_PATH;

/// Config file path.
pub const CONFIG_PATH: &str = "/etc/vidstat/config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database path.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default)]
    pub llm: LlmConfig,
}

/// Completion backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama base URL.
    #[serde(default = "default_llm_url")]
    pub url: String,

    /// Model used for intent extraction.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Completion timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_database_path() -> String {
    DB_PATH.to_string()
}

fn default_llm_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_llm_model() -> String {
    "qwen2.5:7b-instruct".to_string()
}

fn default_llm_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: default_llm_url(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default path, then apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::from_path(CONFIG_PATH);
        config.apply_env();
        config
    }

    fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("failed to parse {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("VIDSTAT_DB") {
            self.database_path = v;
        }
        if let Ok(v) = std::env::var("VIDSTAT_OLLAMA_URL") {
            self.llm.url = v;
        }
        if let Ok(v) = std::env::var("VIDSTAT_OLLAMA_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("VIDSTAT_OLLAMA_TIMEOUT_SECS") {
            match v.parse() {
                Ok(secs) => self.llm.timeout_secs = secs,
                Err(_) => warn!("ignoring invalid VIDSTAT_OLLAMA_TIMEOUT_SECS: {v}"),
            }
        }
    }
}
