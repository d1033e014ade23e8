//! Environment-driven configuration for the retrieval pipeline.
//!
//! The pipeline talks to three external services: an embedding endpoint, a
//! text-generation endpoint, and a Qdrant deployment. All three are wired
//! through environment variables (loaded via `.env` when present) and
//! validated up front — a missing endpoint or credential is a
//! [`RagError::Config`] at construction, never a failure at first use.

use std::env;

use url::Url;

use crate::types::RagError;

/// Name of the single logical collection in the vector store.
pub const DEFAULT_COLLECTION: &str = "documents";

/// Embedding vector dimension. Must match the dimension the collection was
/// created with; [`crate::stores::QdrantIndex::ensure_collection`] verifies
/// this against pre-existing collections.
pub const EMBEDDING_DIM: usize = 1536;

/// Maximum number of texts per embedding request.
pub const EMBED_BATCH_LIMIT: usize = 32;

/// Character window for the text splitter.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Overlap between consecutive chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Number of chunks retrieved to ground an answer.
pub const DEFAULT_TOP_K: usize = 4;

/// In-band token marking the end of a generation turn.
pub const END_OF_TURN: &str = "<|eot_id|>";

/// Resolved pipeline configuration.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Embedding inference endpoint (`HF_EMBEDDING_ENDPOINT_URL`).
    pub embedding_endpoint: Url,
    /// Text-generation inference endpoint (`HF_LLM_ENDPOINT_URL`).
    pub generation_endpoint: Url,
    /// API key shared by both inference endpoints (`HF_API_KEY`).
    pub hf_api_key: String,
    /// Base URL of the Qdrant deployment (`QDRANT_URL`).
    pub qdrant_url: Url,
    /// Optional Qdrant API key (`QDRANT_API_KEY`); local deployments run open.
    pub qdrant_api_key: Option<String>,
    /// Collection holding this deployment's vectors.
    pub collection: String,
    /// Expected embedding dimension.
    pub embedding_dim: usize,
    /// Splitter window size in characters.
    pub chunk_size: usize,
    /// Splitter overlap in characters.
    pub chunk_overlap: usize,
    /// Chunks retrieved per query.
    pub top_k: usize,
}

impl RagConfig {
    /// Loads configuration from the environment, reading `.env` first.
    ///
    /// Fails fast with [`RagError::Config`] when a required endpoint or
    /// credential is absent or malformed.
    pub fn from_env() -> Result<Self, RagError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            embedding_endpoint: required_url("HF_EMBEDDING_ENDPOINT_URL")?,
            generation_endpoint: required_url("HF_LLM_ENDPOINT_URL")?,
            hf_api_key: required("HF_API_KEY")?,
            qdrant_url: required_url("QDRANT_URL")?,
            qdrant_api_key: env::var("QDRANT_API_KEY")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            collection: DEFAULT_COLLECTION.to_string(),
            embedding_dim: EMBEDDING_DIM,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
        })
    }
}

fn required(key: &str) -> Result<String, RagError> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| RagError::Config(format!("{key} environment variable is required")))
}

fn required_url(key: &str) -> Result<Url, RagError> {
    let raw = required(key)?;
    Url::parse(&raw).map_err(|err| RagError::Config(format!("{key} is not a valid URL: {err}")))
}
