use std::path::Path;
use std::sync::Arc;

use crate::config::IngestSettings;
use crate::error::Result;
use crate::models::Chunk;
use crate::rag::embeddings::Embedder;
use crate::rag::vector_store::VectorStore;

use super::chunker::chunk_text;
use super::extractor::{extract_pdf, Document};
use super::walker::list_pdfs;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

/// Batch ingestion: load, chunk, then embed and insert one chunk at a time.
///
/// The first failure aborts the run. Rows inserted before it stay in the
/// store, and a rerun inserts every chunk again.
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chunk_size: usize,
    chunk_overlap: usize,
    progress_every: usize,
}

impl Ingestor {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, settings: &IngestSettings) -> Self {
        Self {
            embedder,
            store,
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            progress_every: settings.progress_every.max(1),
        }
    }

    pub fn load_documents(&self, dir: &Path) -> Result<Vec<Document>> {
        tracing::info!("Loading documents from {}...", dir.display());
        let documents = list_pdfs(dir)
            .iter()
            .map(|path| extract_pdf(path))
            .collect::<Result<Vec<_>>>()?;
        tracing::info!("Loaded {} documents from {}", documents.len(), dir.display());
        Ok(documents)
    }

    pub fn split(&self, documents: &[Document]) -> Vec<String> {
        documents
            .iter()
            .flat_map(|doc| chunk_text(&doc.text, self.chunk_size, self.chunk_overlap))
            .collect()
    }

    /// Embeds and inserts `chunks` in order. `on_progress` receives the
    /// number of chunks stored so far every `progress_every` chunks and once
    /// more when the last chunk is stored.
    pub async fn store_chunks(
        &self,
        chunks: &[String],
        mut on_progress: impl FnMut(usize),
    ) -> Result<usize> {
        let total = chunks.len();
        tracing::info!("Creating embeddings and storing {} chunks in {}...", total, self.store.backend());

        for (i, content) in chunks.iter().enumerate() {
            let embedding = self.embedder.embed(content)?;
            self.store
                .insert(&Chunk {
                    content: content.clone(),
                    embedding,
                    embedding_model: self.embedder.model_id().to_string(),
                })
                .await?;

            let done = i + 1;
            if done % self.progress_every == 0 {
                tracing::info!("Ingested {} of {} chunks.", done, total);
                on_progress(done);
            } else if done == total {
                on_progress(done);
            }
        }

        tracing::info!("Embedding and storage process complete");
        Ok(total)
    }

    pub async fn run(&self, dir: &Path, on_progress: impl FnMut(usize)) -> Result<IngestReport> {
        let documents = self.load_documents(dir)?;
        let chunks = self.split(&documents);
        let stored = self.store_chunks(&chunks, on_progress).await?;
        Ok(IngestReport {
            documents: documents.len(),
            chunks: stored,
        })
    }
}
