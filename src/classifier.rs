//! External image-classification client used by `/image_query`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value as JsonValue;

use crate::config::ClassifierSettings;
use crate::error::{RagError, Result};

/// Label used when the classifier response carries none.
pub const UNKNOWN_LABEL: &str = "unknown issue";

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Text label describing the image, fed back in as a query.
    async fn classify(&self, image: ImageUpload) -> Result<String>;
}

pub struct KindwiseClassifier {
    client: Client,
    url: String,
    api_key: String,
}

impl KindwiseClassifier {
    pub fn new(settings: &ClassifierSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| RagError::config("KINDWISE_API_KEY is not set"))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RagError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: settings.url.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl ImageClassifier for KindwiseClassifier {
    async fn classify(&self, image: ImageUpload) -> Result<String> {
        let mut part = Part::bytes(image.bytes).file_name(image.file_name);
        if let Some(ref content_type) = image.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| RagError::InvalidRequest(format!("bad content type: {}", e)))?;
        }

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .map_err(|e| RagError::Classification(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RagError::Classification(format!(
                "Kindwise API failed: {}",
                error_text
            )));
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| RagError::Classification(format!("malformed response: {}", e)))?;
        Ok(extract_label(&body))
    }
}

fn extract_label(body: &JsonValue) -> String {
    body.get("label")
        .and_then(JsonValue::as_str)
        .filter(|label| !label.trim().is_empty())
        .unwrap_or(UNKNOWN_LABEL)
        .to_string()
}
