use std::sync::Arc;

use crate::classifier::{ImageClassifier, KindwiseClassifier};
use crate::config::Settings;
use crate::error::Result;
use crate::rag::embeddings::{Embedder, FastEmbedder};
use crate::rag::generator::{Generator, LlamaServerClient};
use crate::rag::language::ScriptDetector;
use crate::rag::prompt::TokenBudget;
use crate::rag::vector_store::{self, VectorStore};
use crate::rag::RagEngine;

/// Handles built once at startup and shared read-only by every request.
pub struct AppState {
    pub engine: RagEngine,
    pub classifier: Option<Arc<dyn ImageClassifier>>,
}

impl AppState {
    /// Initializes every backend. A backend that fails is logged and left
    /// unset; requests that need it answer 503.
    pub async fn initialize(settings: &Settings) -> Result<Self> {
        let embedder: Option<Arc<dyn Embedder>> = {
            let embedding = settings.embedding.clone();
            match tokio::task::spawn_blocking(move || FastEmbedder::new(&embedding)).await {
                Ok(Ok(embedder)) => Some(Arc::new(embedder)),
                Ok(Err(e)) => {
                    tracing::warn!("Failed to load embedding model: {}", e);
                    None
                }
                Err(e) => {
                    tracing::warn!("Embedding model loader panicked: {}", e);
                    None
                }
            }
        };

        let dimension = embedder
            .as_ref()
            .map(|e| e.dimension())
            .unwrap_or(settings.embedding.dimension);

        let store: Option<Arc<dyn VectorStore>> = match vector_store::connect(&settings.store, dimension).await {
            Ok(store) => {
                tracing::info!("Vector store ({}) initialized successfully", store.backend());
                Some(store)
            }
            Err(e) => {
                tracing::warn!("Failed to initialize vector store: {}", e);
                None
            }
        };

        let generator: Option<Arc<dyn Generator>> = match LlamaServerClient::connect(&settings.llm).await {
            Ok(client) => {
                tracing::info!("LLM runtime at {} is ready", settings.llm.base_url);
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::warn!("Failed to reach LLM runtime: {}", e);
                None
            }
        };

        let classifier: Option<Arc<dyn ImageClassifier>> = match KindwiseClassifier::new(&settings.classifier) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!("Image classification disabled: {}", e);
                None
            }
        };

        let budget = TokenBudget::new(settings.llm.context_window, settings.llm.max_tokens as usize)?;
        let engine = RagEngine::new(Arc::new(ScriptDetector), budget, settings.store.top_k)
            .with_embedder(embedder)
            .with_store(store)
            .with_generator(generator);

        Ok(Self { engine, classifier })
    }
}
