use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use chrono::Utc;

use super::state::AppState;
use crate::classifier::ImageUpload;
use crate::error::{RagError, Result};
use crate::models::{HealthResponse, ImageQueryParams, QueryRequest, QueryResponse, ServiceStatus};

/// POST /query
pub async fn query_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    tracing::info!("Query: {:?}", request.query);
    let response = state.engine.answer(&request).await?;
    Ok(Json(response))
}

/// POST /image_query: classify the upload, then answer its label as a query.
pub async fn image_query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ImageQueryParams>,
    mut multipart: Multipart,
) -> Result<Json<QueryResponse>> {
    let mut image = None;
    let mut language = params.language;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RagError::InvalidRequest(e.to_string()))?
    {
        match field.name().map(str::to_string).as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| RagError::InvalidRequest(e.to_string()))?;
                image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("language") if language.is_none() => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| RagError::InvalidRequest(e.to_string()))?;
                language = Some(text);
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| RagError::InvalidRequest("missing 'file' upload".to_string()))?;
    let classifier = state
        .classifier
        .as_ref()
        .ok_or_else(|| RagError::Classification("classification service is not configured".to_string()))?;

    let label = classifier.classify(image).await?;
    tracing::info!("Image classified as {:?}", label);

    // Failures past classification are query failures and keep their own
    // status, so a missing database still answers 503 here.
    let response = state
        .engine
        .answer(&QueryRequest {
            query: label,
            language,
        })
        .await?;
    Ok(Json(response))
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let services = ServiceStatus {
        embedding_model: state.engine.has_embedder(),
        vector_store: state.engine.has_store(),
        llm: state.engine.has_generator(),
        classifier: state.classifier.is_some(),
    };
    let healthy = services.embedding_model && services.vector_store && services.llm;

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        services,
    })
}
