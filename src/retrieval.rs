//! Process-wide retrieval store.
//!
//! One [`RetrievalStore`] exists per process, constructed by the composition
//! root and shared across request tasks via `Arc`. It owns the current
//! vector index binding and reconciles its in-memory "initialized" state
//! against what the external collection actually holds, so a restarted
//! process recovers a previously ingested corpus without re-ingesting.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::RagConfig;
use crate::embeddings::EmbeddingProvider;
use crate::ingestion::{CharacterSplitter, DocumentFormat, load_document};
use crate::stores::QdrantIndex;
use crate::types::{RagError, ScoredChunk};

/// Owns the current vector index and its one-way uninitialized → initialized
/// lifecycle.
///
/// The binding is guarded by a `parking_lot::RwLock`; the guard is never
/// held across an await point. Searches run concurrently against the bound
/// index, and a concurrent [`ingest`](Self::ingest) simply replaces the
/// binding — searchers observe either the old or the new index.
pub struct RetrievalStore {
    config: RagConfig,
    provider: Arc<dyn EmbeddingProvider>,
    index: RwLock<Option<Arc<QdrantIndex>>>,
}

impl RetrievalStore {
    /// Creates an unbound store; [`ensure_ready`](Self::ensure_ready) or
    /// [`ingest`](Self::ingest) binds it.
    pub fn new(config: RagConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config,
            provider,
            index: RwLock::new(None),
        }
    }

    /// Returns `true` once an index has been bound for this process.
    pub fn is_initialized(&self) -> bool {
        self.index.read().is_some()
    }

    /// Binds an index handle when the external collection already holds
    /// data from a previous process.
    ///
    /// Best effort: the existence probe's error is collapsed to "not ready"
    /// (recorded at debug level) rather than propagated — the store is
    /// allowed to be transiently unreachable at readiness-check time.
    pub async fn ensure_ready(&self) {
        if self.is_initialized() {
            return;
        }

        let index = match self.fresh_index() {
            Ok(index) => index,
            Err(err) => {
                tracing::debug!(error = %err, "readiness probe skipped: could not construct index handle");
                return;
            }
        };

        match index.has_any_entry().await {
            Ok(true) => {
                tracing::info!(
                    collection = %index.collection(),
                    "external collection already populated, binding index"
                );
                *self.index.write() = Some(Arc::new(index));
            }
            Ok(false) => {}
            Err(err) => {
                tracing::debug!(error = %err, "readiness probe failed, treating store as uninitialized");
            }
        }
    }

    /// Loads, splits, embeds, and uploads the document at `path`, then binds
    /// the fresh index. Replaces any previously bound index for this
    /// process. Returns the number of indexed chunks.
    pub async fn ingest(
        &self,
        path: impl AsRef<Path>,
        format: DocumentFormat,
    ) -> Result<usize, RagError> {
        let segments = load_document(path, format).await?;
        let splitter = CharacterSplitter::new(self.config.chunk_size, self.config.chunk_overlap)?;
        let chunks = splitter.split(&segments);

        let index = self.fresh_index()?;
        index.ensure_collection(self.config.embedding_dim).await?;
        let count = index.build(&chunks, self.provider.as_ref()).await?;

        *self.index.write() = Some(Arc::new(index));
        tracing::info!(chunks = count, collection = %self.config.collection, "document ingested");
        Ok(count)
    }

    /// Searches the bound index for the `k` chunks most similar to `query`.
    ///
    /// An unbound store yields `Ok(vec![])` — "nothing indexed yet" — which
    /// callers must not confuse with a store failure (`Err`).
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        self.ensure_ready().await;
        let Some(index) = self.bound_index() else {
            return Ok(Vec::new());
        };

        let vector = self.provider.embed_query(query).await?;
        index.knn(&vector, k).await
    }

    /// Whether the store is initialized and the external collection holds
    /// data. Probe failures collapse to `false`.
    pub async fn has_content(&self) -> bool {
        self.ensure_ready().await;
        let Some(index) = self.bound_index() else {
            return false;
        };
        index.has_any_entry().await.unwrap_or_else(|err| {
            tracing::debug!(error = %err, "content probe failed");
            false
        })
    }

    fn bound_index(&self) -> Option<Arc<QdrantIndex>> {
        self.index.read().clone()
    }

    fn fresh_index(&self) -> Result<QdrantIndex, RagError> {
        QdrantIndex::new(
            self.config.qdrant_url.clone(),
            self.config.qdrant_api_key.as_deref(),
            self.config.collection.clone(),
        )
    }
}
