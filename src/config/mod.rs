//! Application configuration
//!
//! Settings are layered: built-in defaults, then environment variables
//! (a `.env` file is loaded by `main`), then an optional TOML file, then
//! command line flags.

pub mod file;
pub mod prompts;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileConfig;
pub use prompts::{render_conversation_prompt, PromptTemplate};

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_MODEL: &str = "mistral:latest";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LOG_PATH: &str = "logs/chat_log.jsonl";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ollama_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub log_path: PathBuf,
    pub prompt: PromptTemplate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            prompt: PromptTemplate::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            ollama_url: lookup("OLLAMA_HOST").unwrap_or(defaults.ollama_url),
            model: lookup("OLLAMA_MODEL").unwrap_or(defaults.model),
            temperature: parse_var(&lookup, "OLLAMA_TEMPERATURE")?
                .unwrap_or(defaults.temperature),
            timeout_secs: parse_var(&lookup, "OLLAMA_TIMEOUT_SECS")?
                .unwrap_or(defaults.timeout_secs),
            log_path: lookup("CHAT_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_path),
            prompt: defaults.prompt,
        })
    }

    /// Overlay the values present in a config file
    pub fn merge_file(mut self, file: FileConfig) -> Self {
        if let Some(url) = file.ollama.url {
            self.ollama_url = url;
        }
        if let Some(model) = file.ollama.model {
            self.model = model;
        }
        if let Some(temperature) = file.ollama.temperature {
            self.temperature = temperature;
        }
        if let Some(timeout_secs) = file.ollama.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(path) = file.log.path {
            self.log_path = path;
        }
        if let Some(prompt) = file.prompt {
            self.prompt = prompt;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
