//! ```text
//! Upload ──► ingestion::loader ──► ingestion::splitter ──► chunks
//!                                                            │
//!                    embeddings::EmbeddingProvider ◄─────────┤
//!                                                            ▼
//!                                  stores::QdrantIndex (batched upsert)
//!                                                            │
//! Query ──► retrieval::RetrievalStore::search ──► ranked chunks
//!                                                            │
//!                    generation::AnswerStreamer ◄────────────┘
//!                               │
//!                               └─► sanitized fragment stream to the caller
//! ```
//!
pub mod config;
pub mod embeddings;
pub mod generation;
pub mod ingestion;
pub mod retrieval;
pub mod service;
pub mod stores;
pub mod types;

pub use config::RagConfig;
pub use retrieval::RetrievalStore;
pub use service::{RagService, StatusReport};
pub use types::{RagError, ScoredChunk};
