//! HTTP client for HuggingFace-style embedding inference endpoints.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use url::Url;

use super::EmbeddingProvider;
use crate::config::EMBED_BATCH_LIMIT;
use crate::types::RagError;

/// Async embeddings client for a feature-extraction inference endpoint.
///
/// `embed_documents` transparently batches requests at the configured
/// per-call limit; returned vectors line up with the input order across
/// batch boundaries. Endpoint and credential problems fail at construction.
#[derive(Clone, Debug)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: Url,
    batch_limit: usize,
    expected_dim: usize,
}

impl HttpEmbedder {
    /// Builds a new embedding client.
    pub fn new(endpoint: Url, api_key: &str, expected_dim: usize) -> Result<Self, RagError> {
        if api_key.trim().is_empty() {
            return Err(RagError::Config(
                "embedding service API key is required".to_string(),
            ));
        }

        let auth = format!("Bearer {}", api_key.trim());
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| {
                RagError::Config("embedding service API key is not a valid header value".to_string())
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| RagError::Config(format!("failed to build embedding HTTP client: {err}")))?;

        Ok(Self {
            client,
            endpoint,
            batch_limit: EMBED_BATCH_LIMIT,
            expected_dim,
        })
    }

    /// Overrides the per-request batch limit.
    #[must_use]
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit.max(1);
        self
    }

    /// Maximum number of texts sent per request.
    pub fn batch_limit(&self) -> usize {
        self.batch_limit
    }

    async fn embed_slice(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let request = EmbedRequest { inputs };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RagError::Embedding(format!(
                "embedding endpoint returned {status}: {body}"
            )));
        }

        let vectors: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|err| RagError::Embedding(format!("failed to parse embedding response: {err}")))?;

        if vectors.len() != inputs.len() {
            return Err(RagError::Embedding(format!(
                "endpoint returned {} embeddings for {} inputs",
                vectors.len(),
                inputs.len()
            )));
        }
        for vector in &vectors {
            if vector.len() != self.expected_dim {
                return Err(RagError::Embedding(format!(
                    "embedding dimension {} does not match configured dimension {}",
                    vector.len(),
                    self.expected_dim
                )));
            }
        }

        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_limit) {
            vectors.extend(self.embed_slice(batch).await?);
        }
        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let input = [text.to_string()];
        let mut vectors = self.embed_slice(&input).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("endpoint returned no embedding for query".to_string()))
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
}
