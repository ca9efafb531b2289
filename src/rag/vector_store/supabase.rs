use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Map as JsonMap, Value as JsonValue};

use super::VectorStore;
use crate::config::StoreSettings;
use crate::error::{RagError, Result};
use crate::models::{Chunk, ScoredChunk};

/// PostgREST client for a Supabase table with a `match_documents`-style RPC.
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    key: String,
    table: String,
    match_function: String,
    model_column: Option<String>,
}

impl SupabaseStore {
    pub fn new(settings: &StoreSettings) -> Result<Self> {
        let base_url = settings
            .url
            .as_deref()
            .ok_or_else(|| RagError::config("SUPABASE_URL is not set"))?
            .trim_end_matches('/')
            .to_string();
        let key = settings
            .key
            .clone()
            .ok_or_else(|| RagError::config("SUPABASE_KEY is not set"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RagError::config(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!("Supabase client ready for {}", base_url);
        Ok(Self {
            client,
            base_url,
            key,
            table: settings.table.clone(),
            match_function: settings.match_function.clone(),
            model_column: settings
                .model_column
                .clone()
                .filter(|column| !column.trim().is_empty()),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }
}

fn transport_error(e: reqwest::Error, otherwise: fn(String) -> RagError) -> RagError {
    if e.is_connect() || e.is_timeout() {
        RagError::DatabaseUnreachable(e.to_string())
    } else {
        otherwise(e.to_string())
    }
}

#[async_trait]
impl VectorStore for SupabaseStore {
    fn backend(&self) -> &'static str {
        "supabase"
    }

    async fn insert(&self, chunk: &Chunk) -> Result<()> {
        let url = format!("{}/rest/v1/{}", self.base_url, self.table);

        let mut row = JsonMap::new();
        row.insert("content".to_string(), JsonValue::String(chunk.content.clone()));
        row.insert("embedding".to_string(), json!(chunk.embedding));
        if let Some(ref column) = self.model_column {
            row.insert(column.clone(), JsonValue::String(chunk.embedding_model.clone()));
        }

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| transport_error(e, RagError::Insert))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(insert_failure(status, &body, self.model_column.as_deref()));
        }
        Ok(())
    }

    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, self.match_function);
        let body = json!({
            "query_embedding": embedding,
            "match_count": k,
        });

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, RagError::Search))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::search(format!("{} - {}", status, body)));
        }

        let rows: JsonValue = response
            .json()
            .await
            .map_err(|e| RagError::search(format!("malformed response: {}", e)))?;

        let mut results = parse_match_rows(rows, self.model_column.as_deref())?;
        results.truncate(k);
        Ok(results)
    }
}

/// PostgREST answers PGRST204 when a posted column does not exist, which is
/// what a table without the model column returns.
fn insert_failure(status: reqwest::StatusCode, body: &str, model_column: Option<&str>) -> RagError {
    if let Some(column) = model_column {
        if body.contains("PGRST204") && body.contains(&format!("'{}'", column)) {
            tracing::warn!(
                "Table has no '{}' column; add it (see sql/schema.sql) or set KRISHI__STORE__MODEL_COLUMN to an empty value",
                column
            );
            return RagError::insert(format!(
                "{} - {} (table has no '{}' column; add it or set store.model_column empty)",
                status, body, column
            ));
        }
    }
    RagError::insert(format!("{} - {}", status, body))
}

/// Converts the RPC's JSON rows into scored chunks, keeping the row order.
fn parse_match_rows(rows: JsonValue, model_column: Option<&str>) -> Result<Vec<ScoredChunk>> {
    let JsonValue::Array(rows) = rows else {
        return Err(RagError::search("malformed response: expected an array of rows"));
    };

    rows.into_iter()
        .map(|row| {
            let content = row
                .get("content")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| RagError::search("malformed response: row without content"))?;
            let score = row
                .get("similarity")
                .and_then(JsonValue::as_f64)
                .unwrap_or_default() as f32;
            let embedding_model = model_column
                .and_then(|column| row.get(column))
                .and_then(JsonValue::as_str)
                .map(str::to_string);

            Ok(ScoredChunk {
                content: content.to_string(),
                score,
                embedding_model,
            })
        })
        .collect()
}
