//! Offline ingestion: PDF folder → chunks → embeddings → vector store.

pub mod chunker;
pub mod extractor;
pub mod pipeline;
pub mod walker;

pub use self::pipeline::{IngestReport, Ingestor};
