//! Crate-wide error taxonomy and shared result payloads.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the retrieval pipeline.
///
/// Construction-time configuration problems always surface as [`Config`]
/// and are never retried; runtime failures carry the boundary they crossed
/// so callers can decide whether to propagate or degrade.
///
/// [`Config`]: RagError::Config
#[derive(Debug, Error)]
pub enum RagError {
    /// Missing or invalid configuration detected at construction time.
    #[error("configuration error: {0}")]
    Config(String),

    /// The source document could not be read or parsed.
    #[error("failed to load document: {0}")]
    Load(String),

    /// The embedding service failed or returned an inconsistent response.
    #[error("embedding service error: {0}")]
    Embedding(String),

    /// The vector store failed or returned an inconsistent response.
    #[error("vector store error: {0}")]
    VectorStore(String),

    /// The text-generation service failed, possibly mid-stream.
    #[error("generation stream error: {0}")]
    Generation(String),
}

/// A retrieved chunk paired with its cosine similarity to the query.
///
/// Scores are in `[-1, 1]`; higher means more relevant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f32,
}
