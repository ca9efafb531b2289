pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use self::state::AppState;

pub fn router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/query", post(routes::query_handler))
        .route("/image_query", post(routes::image_query_handler))
        .route("/health", get(routes::health_check))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::classifier::ImageClassifier;
    use crate::models::Chunk;
    use crate::rag::embeddings::Embedder;
    use crate::rag::generator::Generator;
    use crate::rag::prompt::TokenBudget;
    use crate::rag::vector_store::{MemoryStore, VectorStore};
    use crate::rag::RagEngine;
    use crate::testing::{
        FailingEmbedder, FailingStore, FixedClassifier, FixedDetector, HashingEmbedder, ScriptedGenerator,
    };

    fn app(
        store: Option<Arc<dyn VectorStore>>,
        generator: Arc<ScriptedGenerator>,
        classifier: Option<Arc<dyn ImageClassifier>>,
    ) -> Router {
        let generator: Arc<dyn Generator> = generator;
        let engine = RagEngine::new(Arc::new(FixedDetector("en")), TokenBudget::new(4096, 256).unwrap(), 5)
            .with_embedder(Some(Arc::new(HashingEmbedder::default())))
            .with_store(store)
            .with_generator(Some(generator));
        router(Arc::new(AppState { engine, classifier }), Duration::from_secs(5))
    }

    async fn coconut_store() -> Arc<dyn VectorStore> {
        let embedder = HashingEmbedder::default();
        let store = MemoryStore::new();
        let text = "Bud rot of coconut is managed by removing infected tissue and applying Bordeaux paste.";
        store
            .insert(&Chunk {
                content: text.to_string(),
                embedding: embedder.embed(text).unwrap(),
                embedding_model: embedder.model_id().to_string(),
            })
            .await
            .unwrap();
        Arc::new(store)
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_query_without_database_is_503() {
        let app = app(None, Arc::new(ScriptedGenerator::new("unused")), None);

        let response = app
            .oneshot(json_request("/query", json!({"query": "What fertilizer suits coconut saplings?"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            read_json(response).await,
            json!({"detail": "Database connection not available."})
        );
    }

    #[tokio::test]
    async fn test_query_with_empty_store_returns_fixed_answer() {
        let generator = Arc::new(ScriptedGenerator::new("unused"));
        let app = app(Some(Arc::new(MemoryStore::new())), generator.clone(), None);

        let response = app
            .oneshot(json_request("/query", json!({"query": "What fertilizer suits coconut saplings?"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await,
            json!({"answer": "I could not find any relevant information."})
        );
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_query_returns_model_answer() {
        let generator = Arc::new(ScriptedGenerator::new("Remove infected tissue."));
        let app = app(Some(coconut_store().await), generator.clone(), None);

        let response = app
            .oneshot(json_request("/query", json!({"query": "How is bud rot managed?", "language": "ml"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({"answer": "Remove infected tissue."}));
        assert!(generator.prompts()[0].contains("Answer in ml:"));
    }

    #[tokio::test]
    async fn test_embedding_failure_is_500() {
        let generator: Arc<dyn Generator> = Arc::new(ScriptedGenerator::new("unused"));
        let engine = RagEngine::new(Arc::new(FixedDetector("en")), TokenBudget::new(4096, 256).unwrap(), 5)
            .with_embedder(Some(Arc::new(FailingEmbedder)))
            .with_store(Some(Arc::new(MemoryStore::new())))
            .with_generator(Some(generator));
        let app = router(Arc::new(AppState { engine, classifier: None }), Duration::from_secs(5));

        let response = app
            .oneshot(json_request("/query", json!({"query": "bud rot"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        assert!(body["detail"].as_str().unwrap().starts_with("Embedding failed"));
    }

    #[tokio::test]
    async fn test_store_query_failure_is_500() {
        let generator = Arc::new(ScriptedGenerator::new("unused"));
        let app = app(Some(Arc::new(FailingStore)), generator.clone(), None);

        let response = app
            .oneshot(json_request("/query", json!({"query": "bud rot"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Database search failed: "));
        assert_eq!(generator.calls(), 0);
    }

    fn image_request(language: &str) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"leaf.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nJPEGDATA\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"language\"\r\n\r\n{l}\r\n\
             --{b}--\r\n",
            b = boundary,
            l = language
        );
        Request::builder()
            .method("POST")
            .uri("/image_query")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_image_query_keeps_query_stage_status() {
        let classifier: Arc<dyn ImageClassifier> = Arc::new(FixedClassifier("coconut bud rot"));
        let app = app(None, Arc::new(ScriptedGenerator::new("unused")), Some(classifier));

        let response = app.oneshot(image_request("en")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            read_json(response).await,
            json!({"detail": "Database connection not available."})
        );
    }

    #[tokio::test]
    async fn test_image_query_reenters_query_pipeline() {
        let generator = Arc::new(ScriptedGenerator::new("Apply Bordeaux paste."));
        let classifier: Arc<dyn ImageClassifier> = Arc::new(FixedClassifier("coconut bud rot"));
        let app = app(Some(coconut_store().await), generator.clone(), Some(classifier));

        let response = app.oneshot(image_request("ml")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({"answer": "Apply Bordeaux paste."}));
        let prompts = generator.prompts();
        assert!(prompts[0].contains("Question: coconut bud rot"));
        assert!(prompts[0].contains("Answer in ml:"));
    }

    #[tokio::test]
    async fn test_image_query_without_file_is_400() {
        let classifier: Arc<dyn ImageClassifier> = Arc::new(FixedClassifier("bud rot"));
        let app = app(None, Arc::new(ScriptedGenerator::new("unused")), Some(classifier));

        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"language\"\r\n\r\nen\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method("POST")
            .uri("/image_query")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_reports_missing_backends() {
        let app = app(None, Arc::new(ScriptedGenerator::new("unused")), None);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["services"]["vector_store"], false);
        assert_eq!(body["services"]["llm"], true);
    }
}
