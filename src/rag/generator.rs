use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::config::LlmSettings;
use crate::error::{RagError, Result};

#[async_trait]
pub trait Generator: Send + Sync {
    /// Raw model output for `prompt`; not retried.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    temperature: f32,
    n_predict: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    content: String,
}

/// Client for a local llama.cpp server (`/completion` endpoint).
///
/// The runtime hosts a single model instance, so calls queue on a semaphore
/// instead of piling onto the server.
pub struct LlamaServerClient {
    client: Client,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    permits: Semaphore,
}

impl LlamaServerClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RagError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            permits: Semaphore::new(settings.max_concurrent.max(1)),
        })
    }

    /// Builds the client and fails unless the runtime reports healthy.
    pub async fn connect(settings: &LlmSettings) -> Result<Self> {
        let client = Self::new(settings)?;
        if !client.health_check().await? {
            return Err(RagError::LlmUnreachable(format!(
                "{} did not report healthy",
                client.base_url
            )));
        }
        Ok(client)
    }

    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RagError::LlmUnreachable(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl Generator for LlamaServerClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/completion", self.base_url);
        let request = CompletionRequest {
            prompt,
            temperature: self.temperature,
            n_predict: self.max_tokens,
            stream: false,
        };

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| RagError::generation(e.to_string()))?;

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    RagError::LlmUnreachable(e.to_string())
                } else {
                    RagError::generation(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RagError::generation(format!("{} - {}", status, error_text)));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| RagError::generation(format!("malformed response: {}", e)))?;
        Ok(completion.content)
    }
}
