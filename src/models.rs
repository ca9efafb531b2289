use serde::{Deserialize, Serialize};

/// Fixed answer returned when retrieval finds no usable context.
pub const NO_INFORMATION_ANSWER: &str = "I could not find any relevant information.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
}

impl QueryResponse {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }

    pub fn no_information() -> Self {
        Self::new(NO_INFORMATION_ANSWER)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageQueryParams {
    #[serde(default)]
    pub language: Option<String>,
}

/// A stored passage and the vector it was indexed under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub embedding: Vec<f32>,
    /// Identifier of the model that produced `embedding`.
    pub embedding_model: String,
}

/// One row of a similarity search, best match first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub content: String,
    pub score: f32,
    #[serde(default)]
    pub embedding_model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub services: ServiceStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub embedding_model: bool,
    pub vector_store: bool,
    pub llm: bool,
    pub classifier: bool,
}
