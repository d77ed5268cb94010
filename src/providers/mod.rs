//! Inference server integrations

mod ollama;
pub mod stream;

use thiserror::Error;

use crate::config::Config;

pub use ollama::{GenerateOptions, OllamaProvider};
pub use stream::Assembled;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub enum Provider {
    Ollama(OllamaProvider),
}

impl Provider {
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        Ok(Provider::Ollama(OllamaProvider::new(
            config.ollama_url.clone(),
            config.timeout(),
        )?))
    }

    /// Send a prompt and assemble the streamed reply
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Assembled, ProviderError> {
        match self {
            Provider::Ollama(p) => p.generate(prompt, options).await,
        }
    }
}
