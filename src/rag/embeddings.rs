use std::path::Path;

use fastembed::{
    EmbeddingModel, InitOptions, InitOptionsUserDefined, TextEmbedding, TokenizerFiles,
    UserDefinedEmbeddingModel,
};

use crate::config::EmbeddingSettings;
use crate::error::{RagError, Result};

/// Maps text into the vector space shared by ingestion and retrieval.
///
/// Both pipelines must be built from the same settings: vectors from
/// different models are not comparable and nothing in the math says so.
pub trait Embedder: Send + Sync {
    /// Stable identifier written next to every stored vector.
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

pub struct FastEmbedder {
    model: TextEmbedding,
    model_id: String,
    dimension: usize,
}

impl FastEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        match settings.model_dir {
            Some(ref dir) => Self::from_dir(dir, settings.dimension),
            None => Self::builtin(&settings.model, settings.show_download_progress),
        }
    }

    fn builtin(name: &str, show_download_progress: bool) -> Result<Self> {
        let (model_name, dimension) = match name {
            "multilingual-e5-small" => (EmbeddingModel::MultilingualE5Small, 384),
            "multilingual-e5-base" => (EmbeddingModel::MultilingualE5Base, 768),
            "multilingual-e5-large" => (EmbeddingModel::MultilingualE5Large, 1024),
            other => return Err(RagError::config(format!("Unknown embedding model: {}", other))),
        };

        tracing::info!("Initializing embedding model {}...", name);
        let model = TextEmbedding::try_new(InitOptions {
            model_name,
            show_download_progress,
            ..Default::default()
        })
        .map_err(|e| RagError::config(format!("Failed to initialize embedding model: {}", e)))?;

        tracing::info!("Embedding model initialized successfully");
        Ok(Self {
            model,
            model_id: name.to_string(),
            dimension,
        })
    }

    fn from_dir(model_dir: &Path, dimension: usize) -> Result<Self> {
        tracing::info!("Initializing embedding model from {}...", model_dir.display());

        if !model_dir.exists() {
            return Err(RagError::config(format!(
                "Model directory not found: {}",
                model_dir.display()
            )));
        }

        let read = |name: &str| {
            std::fs::read(model_dir.join(name))
                .map_err(|e| RagError::config(format!("Failed to read {}: {}", name, e)))
        };

        let user_model = UserDefinedEmbeddingModel {
            onnx_file: read("model.onnx")?,
            tokenizer_files: TokenizerFiles {
                tokenizer_file: read("tokenizer.json")?,
                config_file: read("config.json")?,
                special_tokens_map_file: read("special_tokens_map.json")?,
                tokenizer_config_file: read("tokenizer_config.json")?,
            },
        };

        let model = TextEmbedding::try_new_from_user_defined(user_model, InitOptionsUserDefined::default())
            .map_err(|e| RagError::config(format!("Failed to initialize embedding model: {}", e)))?;

        let model_id = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| model_dir.display().to_string());

        tracing::info!("Embedding model {} initialized successfully", model_id);
        Ok(Self {
            model,
            model_id,
            dimension,
        })
    }
}

impl Embedder for FastEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self
            .model
            .embed(vec![text], None)
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        let embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("model returned no vector".to_string()))?;

        if embedding.len() != self.dimension {
            return Err(RagError::Embedding(format!(
                "expected {} dimensions, model produced {}",
                self.dimension,
                embedding.len()
            )));
        }
        Ok(embedding)
    }
}
