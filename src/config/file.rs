//! Optional TOML configuration file
//!
//! Every key is optional; anything left out keeps the value coming from the
//! environment or the built-in defaults.
//!
//! ```toml
//! [ollama]
//! url = "http://127.0.0.1:11434"
//! model = "mistral:latest"
//! temperature = 0.2
//! timeout_secs = 120
//!
//! [log]
//! path = "logs/chat_log.jsonl"
//!
//! [prompt]
//! preamble = "You are a terse assistant."
//! history_header = "Earlier in this chat:"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{ConfigError, PromptTemplate};

/// Root of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Inference server settings
    #[serde(default)]
    pub ollama: OllamaSection,

    /// Chat log settings
    #[serde(default)]
    pub log: LogSection,

    /// Prompt template override
    #[serde(default)]
    pub prompt: Option<PromptTemplate>,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig = toml::from_str(content)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OllamaSection {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSection {
    /// Where the JSONL chat log is appended
    #[serde(default)]
    pub path: Option<PathBuf>,
}
