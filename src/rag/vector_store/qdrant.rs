use async_trait::async_trait;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::{Map as JsonMap, Value as JsonValue};
use uuid::Uuid;

use super::VectorStore;
use crate::error::{RagError, Result};
use crate::models::{Chunk, ScoredChunk};

pub struct QdrantStore {
    client: Qdrant,
    collection_name: String,
}

impl QdrantStore {
    pub async fn new(url: &str, collection_name: &str, dimension: usize) -> Result<Self> {
        tracing::info!("Building Qdrant client for URL: {}", url);
        let client = Qdrant::from_url(url).build().map_err(|e| {
            tracing::error!("Qdrant client build failed: {:?}", e);
            RagError::config(format!("Qdrant client build failed: {}", e))
        })?;

        let store = Self {
            client,
            collection_name: collection_name.to_string(),
        };

        tracing::info!("Checking Qdrant collection {}...", collection_name);
        store.ensure_collection(dimension).await?;
        tracing::info!("Qdrant collection ready");

        Ok(store)
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection_name)
            .await
            .map_err(|e| RagError::DatabaseUnreachable(e.to_string()))?;

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection_name)
                        .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
                )
                .await
                .map_err(|e| RagError::config(format!("Failed to create collection: {}", e)))?;
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn backend(&self) -> &'static str {
        "qdrant"
    }

    async fn insert(&self, chunk: &Chunk) -> Result<()> {
        let mut payload = JsonMap::new();
        payload.insert("content".to_string(), JsonValue::String(chunk.content.clone()));
        payload.insert(
            "embedding_model".to_string(),
            JsonValue::String(chunk.embedding_model.clone()),
        );
        // Random ids: re-ingesting the same text appends a new point.
        let point = PointStruct::new(Uuid::new_v4().to_string(), chunk.embedding.clone(), payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection_name, vec![point]))
            .await
            .map_err(|e| RagError::insert(e.to_string()))?;

        Ok(())
    }

    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let search_result = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection_name, embedding.to_vec(), k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| RagError::search(e.to_string()))?;

        let mut results = Vec::with_capacity(search_result.result.len());
        for point in search_result.result {
            let content = point
                .payload
                .get("content")
                .and_then(|v| v.as_str())
                .ok_or_else(|| RagError::search("point payload has no text content"))?;
            let embedding_model = point
                .payload
                .get("embedding_model")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            results.push(ScoredChunk {
                content: content.to_string(),
                score: point.score,
                embedding_model,
            });
        }
        results.truncate(k);

        Ok(results)
    }
}
