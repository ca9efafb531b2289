//! Adapters to the external nearest-neighbour store.
//!
//! The store owns indexing and ranking; adapters only persist rows and relay
//! top-k queries.

mod memory;
mod qdrant;
mod supabase;

use std::sync::Arc;

use async_trait::async_trait;

pub use self::memory::MemoryStore;
pub use self::qdrant::QdrantStore;
pub use self::supabase::SupabaseStore;

use crate::config::{StoreBackend, StoreSettings};
use crate::error::{RagError, Result};
use crate::models::{Chunk, ScoredChunk};

#[async_trait]
pub trait VectorStore: Send + Sync {
    fn backend(&self) -> &'static str;

    /// Appends one row. There are no update or delete semantics.
    async fn insert(&self, chunk: &Chunk) -> Result<()>;

    /// At most `k` rows, most similar first.
    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;
}

/// Builds the configured backend. `dimension` sizes newly created collections.
pub async fn connect(settings: &StoreSettings, dimension: usize) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match settings.backend {
        StoreBackend::Supabase => Arc::new(SupabaseStore::new(settings)?),
        StoreBackend::Qdrant => {
            let url = settings
                .url
                .as_deref()
                .ok_or_else(|| RagError::config("store.url is not set for the qdrant backend"))?;
            Arc::new(QdrantStore::new(url, &settings.table, dimension).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory vector store; rows are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}
