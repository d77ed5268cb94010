//! Durable chat log
//!
//! Every completed exchange is appended to a JSONL file as a single line, so
//! a crash can lose at most the line being written. The same file is read
//! back at startup to restore the conversation history.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Identifier written in the `user` field of every entry
pub const LOCAL_USER: &str = "local_cli";

/// One logged exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO-8601 UTC time with a trailing `Z`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub timestamp: String,

    /// Who sent the prompt
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user: String,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub prompt: String,

    /// Assembled reply text
    #[serde(default, deserialize_with = "null_as_empty")]
    pub response: String,
}

/// Older or hand-edited logs may carry `null` where a string is expected
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl LogEntry {
    /// Create an entry stamped with the current time
    pub fn new(model: Option<&str>, prompt: &str, response: &str) -> Self {
        Self {
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            user: LOCAL_USER.to_string(),
            model: model.map(str::to_string),
            prompt: prompt.to_string(),
            response: response.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Log IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Append-only JSONL log of exchanges
#[derive(Debug, Clone)]
pub struct ChatLogger {
    path: PathBuf,
}

impl ChatLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, creating the file and its directory if needed
    pub async fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    /// Read every parseable entry in file order.
    ///
    /// A missing file is an empty log. Blank and corrupt lines are skipped
    /// one by one.
    pub async fn read_entries(&self) -> Result<Vec<LogEntry>, LogError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let content = String::from_utf8_lossy(&bytes);
        let mut entries = Vec::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::debug!(line = number + 1, "Skipping unreadable log line: {}", e);
                }
            }
        }

        Ok(entries)
    }
}
