pub mod embeddings;
pub mod generator;
pub mod language;
pub mod prompt;
pub mod vector_store;

use std::sync::Arc;

use self::embeddings::Embedder;
use self::generator::Generator;
use self::language::{resolve_language, LanguageDetector};
use self::prompt::{build_prompt, TokenBudget};
use self::vector_store::VectorStore;
use crate::error::{RagError, Result};
use crate::models::{QueryRequest, QueryResponse};

/// Query-time pipeline: language resolution, retrieval, grounded prompt and
/// generation.
///
/// Each backend handle is optional so the service can start with a broken
/// dependency and report it per request instead of refusing to boot.
pub struct RagEngine {
    embedder: Option<Arc<dyn Embedder>>,
    store: Option<Arc<dyn VectorStore>>,
    generator: Option<Arc<dyn Generator>>,
    detector: Arc<dyn LanguageDetector>,
    budget: TokenBudget,
    top_k: usize,
}

impl RagEngine {
    pub fn new(detector: Arc<dyn LanguageDetector>, budget: TokenBudget, top_k: usize) -> Self {
        Self {
            embedder: None,
            store: None,
            generator: None,
            detector,
            budget,
            top_k,
        }
    }

    pub fn with_embedder(mut self, embedder: Option<Arc<dyn Embedder>>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_store(mut self, store: Option<Arc<dyn VectorStore>>) -> Self {
        self.store = store;
        self
    }

    pub fn with_generator(mut self, generator: Option<Arc<dyn Generator>>) -> Self {
        self.generator = generator;
        self
    }

    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn answer(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let question = request.query.as_str();
        if question.trim().is_empty() {
            return Err(RagError::InvalidRequest("query must not be empty".to_string()));
        }

        let generator = self.generator.as_ref().ok_or(RagError::LlmUnavailable)?;
        if self.embedder.is_none() {
            return Err(RagError::EmbeddingUnavailable);
        }

        let language = resolve_language(question, request.language.as_deref(), self.detector.as_ref());
        tracing::info!(language = %language.code, source = ?language.source, "Resolved response language");

        let passages = self.retrieve_context(question).await?;
        if passages.is_empty() {
            tracing::info!("No matching context for query");
            return Ok(QueryResponse::no_information());
        }

        let context = self.budget.fit_context(&passages, question, &language.code);
        if context.is_empty() {
            tracing::warn!("Query leaves no room for context in the model window");
            return Ok(QueryResponse::no_information());
        }

        let prompt = build_prompt(&context, question, &language.code);
        let answer = generator.generate(&prompt).await?;
        tracing::info!("Generated answer ({} chars) from {} passages", answer.len(), passages.len());

        Ok(QueryResponse::new(answer))
    }

    /// Embeds `query` and returns the contents of the top-k matches, best
    /// first. Rows written by a different embedding model are discarded.
    pub async fn retrieve_context(&self, query: &str) -> Result<Vec<String>> {
        let embedder = Arc::clone(self.embedder.as_ref().ok_or(RagError::EmbeddingUnavailable)?);
        let model_id = embedder.model_id().to_string();

        let text = query.to_string();
        let query_embedding = tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await
            .map_err(|e| RagError::Embedding(e.to_string()))??;

        let store = self.store.as_ref().ok_or(RagError::DatabaseUnavailable)?;
        let results = store.search(&query_embedding, self.top_k).await?;

        let passages = results
            .into_iter()
            .filter(|r| match r.embedding_model.as_deref() {
                Some(stored) if stored != model_id => {
                    tracing::warn!(
                        "Skipping row embedded with '{}' (running '{}')",
                        stored,
                        model_id
                    );
                    false
                }
                _ => true,
            })
            .map(|r| r.content)
            .filter(|content| !content.trim().is_empty())
            .collect();

        Ok(passages)
    }
}
