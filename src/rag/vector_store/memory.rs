use async_trait::async_trait;
use tokio::sync::RwLock;

use super::VectorStore;
use crate::error::{RagError, Result};
use crate::models::{Chunk, ScoredChunk};

/// Append-only in-process store ranked by cosine similarity.
#[derive(Default)]
pub struct MemoryStore {
    chunks: RwLock<Vec<Chunk>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, chunk: &Chunk) -> Result<()> {
        let mut chunks = self.chunks.write().await;
        if let Some(first) = chunks.first() {
            if first.embedding.len() != chunk.embedding.len() {
                return Err(RagError::insert(format!(
                    "dimension mismatch: store holds {}, got {}",
                    first.embedding.len(),
                    chunk.embedding.len()
                )));
            }
        }
        chunks.push(chunk.clone());
        Ok(())
    }

    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let chunks = self.chunks.read().await;

        let mut scored: Vec<ScoredChunk> = chunks
            .iter()
            .filter(|c| c.embedding.len() == embedding.len())
            .map(|c| ScoredChunk {
                content: c.content.clone(),
                score: cosine_similarity(&c.embedding, embedding),
                embedding_model: Some(c.embedding_model.clone()),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}
