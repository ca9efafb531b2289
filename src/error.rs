//! Error types shared by the serving and ingestion pipelines.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Debug, Error)]
pub enum RagError {
    /// The language model handle was never initialized.
    #[error("LLM not initialized. Please check the model path and installation.")]
    LlmUnavailable,

    /// The embedding model handle was never initialized.
    #[error("Embedding model not initialized. This may be due to a poor internet connection or an incorrect model name. Please check your setup.")]
    EmbeddingUnavailable,

    /// The vector store client was never initialized.
    #[error("Database connection not available.")]
    DatabaseUnavailable,

    /// The vector store could not be reached at request time.
    #[error("Database unreachable: {0}")]
    DatabaseUnreachable(String),

    /// The language model runtime could not be reached at request time.
    #[error("LLM unreachable: {0}")]
    LlmUnreachable(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Database search failed: {0}")]
    Search(String),

    #[error("Database insert failed: {0}")]
    Insert(String),

    #[error("LLM generation failed: {0}")]
    Generation(String),

    #[error("Image processing failed: {0}")]
    Classification(String),

    #[error("Failed to extract text from '{path}': {message}")]
    Extraction { path: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RagError {
    pub fn search(message: impl Into<String>) -> Self {
        Self::Search(message.into())
    }

    pub fn insert(message: impl Into<String>) -> Self {
        Self::Insert(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RagError::LlmUnavailable
            | RagError::EmbeddingUnavailable
            | RagError::DatabaseUnavailable
            | RagError::DatabaseUnreachable(_)
            | RagError::LlmUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RagError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RagError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, "request failed: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
