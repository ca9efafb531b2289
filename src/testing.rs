//! Deterministic stand-ins for the model-backed handles.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::classifier::{ImageClassifier, ImageUpload};
use crate::error::{RagError, Result};
use crate::models::{Chunk, ScoredChunk};
use crate::rag::embeddings::Embedder;
use crate::rag::generator::Generator;
use crate::rag::language::{DetectionError, LanguageDetector};
use crate::rag::vector_store::VectorStore;

/// Bag-of-words vectors: texts sharing words land close together.
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dimension: 256 }
    }
}

impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        "hashing-test"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % self.dimension as u64) as usize] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }
}

pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn model_id(&self) -> &str {
        "failing-test"
    }

    fn dimension(&self) -> usize {
        4
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::Embedding("onnx session closed".to_string()))
    }
}

/// A reachable store whose every query and insert is rejected.
pub struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn insert(&self, _chunk: &Chunk) -> Result<()> {
        Err(RagError::insert("permission denied for table knowledge_base"))
    }

    async fn search(&self, _embedding: &[f32], _k: usize) -> Result<Vec<ScoredChunk>> {
        Err(RagError::search("function match_documents does not exist"))
    }
}

/// Returns a canned answer and records every prompt it receives.
pub struct ScriptedGenerator {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(cause: &str) -> Self {
        Self {
            reply: Err(cause.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(RagError::generation)
    }
}

pub struct FixedDetector(pub &'static str);

impl LanguageDetector for FixedDetector {
    fn detect(&self, _text: &str) -> std::result::Result<String, DetectionError> {
        Ok(self.0.to_string())
    }
}

/// Labels every image with the same text.
pub struct FixedClassifier(pub &'static str);

#[async_trait]
impl ImageClassifier for FixedClassifier {
    async fn classify(&self, image: ImageUpload) -> Result<String> {
        if image.bytes.is_empty() {
            return Err(RagError::Classification("empty upload".to_string()));
        }
        Ok(self.0.to_string())
    }
}
