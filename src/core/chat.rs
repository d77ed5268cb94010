//! Chat engine
//!
//! The ChatEngine runs one exchange at a time:
//! 1. Renders the prompt from the template, history and user input
//! 2. Streams the reply from the inference server
//! 3. Records the turn in memory
//! 4. Appends the exchange to the chat log
//!
//! Only a transport failure fails an exchange. Memory and log problems are
//! reported and the reply is still returned.

use uuid::Uuid;

use crate::config::{Config, PromptTemplate};
use crate::providers::{GenerateOptions, Provider, ProviderError};

use super::logger::{ChatLogger, LogEntry};
use super::memory::ConversationMemory;

/// Reply to one user message
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The assistant's reply
    pub message: String,

    /// Whether the turn made it into memory
    pub memory_saved: bool,

    /// Whether the exchange was appended to the chat log
    pub logged: bool,

    /// Number of stream fragments received
    pub fragments: usize,
}

/// Errors from the chat engine
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Ollama request failed: {0}")]
    Provider(#[from] ProviderError),
}

/// The core chat engine
pub struct ChatEngine {
    provider: Provider,
    memory: ConversationMemory,
    logger: ChatLogger,
    template: PromptTemplate,
    options: GenerateOptions,
}

impl ChatEngine {
    /// Create a new chat engine
    pub fn new(config: &Config) -> Result<Self, ChatError> {
        Ok(Self {
            provider: Provider::from_config(config)?,
            memory: ConversationMemory::new(),
            logger: ChatLogger::new(&config.log_path),
            template: config.prompt.clone(),
            options: GenerateOptions {
                model: config.model.clone(),
                temperature: config.temperature,
            },
        })
    }

    /// Seed memory from the chat log.
    ///
    /// An unreadable log leaves the history empty; startup carries on.
    pub async fn restore_history(&mut self) -> usize {
        match self.logger.read_entries().await {
            Ok(entries) => {
                let restored = self.memory.seed_from_log(entries);
                tracing::info!(
                    restored,
                    path = %self.logger.path().display(),
                    "Restored conversation history"
                );
                restored
            }
            Err(e) => {
                tracing::warn!("Could not replay chat log, starting fresh: {}", e);
                0
            }
        }
    }

    /// Process one user message and return the reply
    #[tracing::instrument(skip_all, fields(exchange = %Uuid::new_v4()))]
    pub async fn chat(&mut self, message: &str) -> Result<ChatResponse, ChatError> {
        let history = self.memory.render_history();
        let prompt = self.template.render(message, Some(history.as_str()));

        let assembled = self.provider.generate(&prompt, &self.options).await?;

        let memory_saved = match self.memory.record_turn(message, &assembled.text) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to save turn to memory: {}", e);
                false
            }
        };

        let entry = LogEntry::new(Some(self.options.model.as_str()), message, &assembled.text);
        let logged = match self.logger.append(&entry).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = %self.logger.path().display(), "Failed to write chat log: {}", e);
                false
            }
        };

        tracing::info!(fragments = assembled.fragments.len(), "Exchange complete");

        Ok(ChatResponse {
            message: assembled.text,
            memory_saved,
            logged,
            fragments: assembled.fragments.len(),
        })
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Short display name for the model
    pub fn model_label(&self) -> &str {
        model_label(&self.options.model)
    }
}

/// Strip a `namespace/` prefix and `:tag` suffix from a model name.
///
/// `library/mistral:latest` becomes `mistral`. Falls back to the full name
/// when nothing is left.
pub fn model_label(model: &str) -> &str {
    let name = model.rsplit('/').next().unwrap_or(model);
    let name = name.split(':').next().unwrap_or(name);
    if name.is_empty() {
        model
    } else {
        name
    }
}
