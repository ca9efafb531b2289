//! Retrieval-augmented question answering over an agricultural PDF corpus.
//!
//! `indexer` turns a folder of PDFs into embedded chunks; `rag` embeds a
//! question, retrieves matching chunks and asks a local model to answer from
//! them alone; `server` exposes that over HTTP.

pub mod classifier;
pub mod config;
pub mod error;
pub mod indexer;
pub mod models;
pub mod rag;
pub mod server;

#[cfg(test)]
mod testing;

pub use error::{RagError, Result};
