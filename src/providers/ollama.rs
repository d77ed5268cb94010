//! Ollama provider implementation

use std::time::Duration;

use futures::{pin_mut, StreamExt};
use reqwest::Client;
use serde::Serialize;

use super::stream::{decode_fragments, split_lines, Assembled, ResponseAssembler};
use super::ProviderError;

pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

/// Per-request generation settings
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
}

impl OllamaProvider {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    /// Post a prompt to `/api/generate` and assemble the streamed reply.
    ///
    /// Any transport problem (connect, timeout, non-success status, broken
    /// body) fails the whole request; no partial text is returned.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Assembled, ProviderError> {
        let request = GenerateRequest {
            model: &options.model,
            prompt,
            temperature: options.temperature,
        };

        let url = self.endpoint();
        tracing::debug!(%url, model = %options.model, "Sending generate request");

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::InvalidResponse(format!(
                "{}: {}",
                status, body
            )));
        }

        let mut raw_body = Vec::new();
        let mut assembler = ResponseAssembler::new();
        {
            let bytes = response.bytes_stream().inspect(|chunk| {
                if let Ok(chunk) = chunk {
                    raw_body.extend_from_slice(chunk);
                }
            });
            let fragments = decode_fragments(split_lines(bytes));
            pin_mut!(fragments);

            while let Some(fragment) = fragments.next().await {
                assembler.push(fragment?);
            }
        }

        let raw_body = String::from_utf8_lossy(&raw_body);
        let assembled = assembler.finish(&raw_body);
        tracing::debug!(
            fragments = assembled.fragments.len(),
            chars = assembled.text.len(),
            "Response assembled"
        );

        Ok(assembled)
    }
}
