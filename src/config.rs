//! Layered configuration: defaults, optional TOML files, then environment.

use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{RagError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub classifier: ClassifierSettings,
    pub ingest: IngestSettings,
}

impl Settings {
    /// Loads settings from `config/default.toml`, `config/local.toml`,
    /// `KRISHI__SECTION__KEY` variables and the legacy `SUPABASE_URL`,
    /// `SUPABASE_KEY` and `KINDWISE_API_KEY` variables, later sources winning.
    pub fn load() -> Result<Self> {
        let built = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("KRISHI")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("store.url", non_empty_env("SUPABASE_URL"))
            .and_then(|b| b.set_override_option("store.key", non_empty_env("SUPABASE_KEY")))
            .and_then(|b| {
                b.set_override_option("classifier.api_key", non_empty_env("KINDWISE_API_KEY"))
            })
            .map_err(|e| RagError::config(e.to_string()))?
            .build()
            .map_err(|e| RagError::config(e.to_string()))?;

        built
            .try_deserialize()
            .map_err(|e| RagError::config(e.to_string()))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Upper bound on a whole request, generation included.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Supabase,
    Qdrant,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub key: Option<String>,
    /// Table (Supabase) or collection (Qdrant) holding the chunks.
    pub table: String,
    /// Nearest-neighbour RPC exposed by the database.
    pub match_function: String,
    /// Column recording the embedding model of each row; `None` keeps the
    /// two-column schema.
    pub model_column: Option<String>,
    pub top_k: usize,
    pub timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Supabase,
            url: None,
            key: None,
            table: "knowledge_base".to_string(),
            match_function: "match_documents".to_string(),
            model_column: Some("embedding_model".to_string()),
            top_k: 5,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Built-in fastembed model, ignored when `model_dir` is set.
    pub model: String,
    /// Directory with `model.onnx` and tokenizer files of a local model.
    pub model_dir: Option<PathBuf>,
    /// Output dimension of the local model in `model_dir`.
    pub dimension: usize,
    pub show_download_progress: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "multilingual-e5-small".to_string(),
            model_dir: None,
            dimension: 384,
            show_download_progress: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub context_window: usize,
    pub timeout_secs: u64,
    /// Concurrent generations allowed against the runtime.
    pub max_concurrent: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            temperature: 0.7,
            max_tokens: 256,
            context_window: 4096,
            timeout_secs: 300,
            max_concurrent: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            url: "https://api.kindwise.com/classify".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub data_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub progress_every: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            chunk_size: 1000,
            chunk_overlap: 100,
            progress_every: 50,
        }
    }
}
