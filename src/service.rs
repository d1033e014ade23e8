//! Composition root: wires the pipeline components behind the entry points
//! the transport layer consumes.

use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::Serialize;

use crate::config::RagConfig;
use crate::embeddings::{EmbeddingProvider, HttpEmbedder};
use crate::generation::{AnswerStreamer, GenerationModel, HttpGenerator, error_fragment};
use crate::ingestion::DocumentFormat;
use crate::retrieval::RetrievalStore;
use crate::types::RagError;

/// Readiness report consumed by the status endpoint.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct StatusReport {
    pub has_content: bool,
}

/// One retrieval pipeline per process: the shared retrieval store plus the
/// answer streamer. Constructed once at startup and passed by reference to
/// request handlers.
pub struct RagService {
    store: Arc<RetrievalStore>,
    streamer: AnswerStreamer,
    top_k: usize,
}

impl RagService {
    /// Wires the real HTTP providers from configuration.
    ///
    /// Fails fast with [`RagError::Config`] on missing credentials or
    /// endpoints; no network traffic is issued here.
    pub fn new(config: RagConfig) -> Result<Self, RagError> {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(HttpEmbedder::new(
            config.embedding_endpoint.clone(),
            &config.hf_api_key,
            config.embedding_dim,
        )?);
        let model: Arc<dyn GenerationModel> = Arc::new(HttpGenerator::new(
            config.generation_endpoint.clone(),
            &config.hf_api_key,
        )?);
        Ok(Self::with_components(config, provider, model))
    }

    /// Wires the pipeline with injected providers (tests, alternative
    /// stacks).
    pub fn with_components(
        config: RagConfig,
        provider: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn GenerationModel>,
    ) -> Self {
        let top_k = config.top_k;
        Self {
            store: Arc::new(RetrievalStore::new(config, provider)),
            streamer: AnswerStreamer::new(model),
            top_k,
        }
    }

    /// Shared handle to the process-wide retrieval store.
    pub fn store(&self) -> Arc<RetrievalStore> {
        Arc::clone(&self.store)
    }

    /// Ingestion entry point: chunks and indexes the document at `path`.
    /// Returns the number of indexed chunks.
    pub async fn ingest(&self, path: impl AsRef<Path>, is_paginated: bool) -> Result<usize, RagError> {
        let format = if is_paginated {
            DocumentFormat::Paginated
        } else {
            DocumentFormat::PlainText
        };
        self.store.ingest(path, format).await
    }

    /// Query entry point: readiness of the pipeline.
    pub async fn status(&self) -> StatusReport {
        StatusReport {
            has_content: self.store.has_content().await,
        }
    }

    /// Query entry point: a sanitized answer stream grounded in retrieved
    /// context.
    ///
    /// An uninitialized store answers through the no-documents prompt path;
    /// a retrieval failure surfaces as a single in-band `{"error": …}`
    /// fragment rather than a transport-level failure.
    pub async fn ask(&self, question: &str) -> BoxStream<'static, String> {
        let context = match self.store.search(question, self.top_k).await {
            Ok(results) => results
                .into_iter()
                .map(|chunk| chunk.text)
                .collect::<Vec<_>>()
                .join("\n"),
            Err(err) => {
                tracing::warn!(error = %err, "context retrieval failed");
                let payload = error_fragment(&err);
                return futures_util::stream::once(async move { payload }).boxed();
            }
        };
        self.streamer.stream(question, &context)
    }
}
