//! Qdrant-backed vector index over the collection REST API.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::EMBED_BATCH_LIMIT;
use crate::embeddings::EmbeddingProvider;
use crate::types::{RagError, ScoredChunk};

/// Handle to one named collection in an external Qdrant deployment.
///
/// Construction is purely local; the collection itself is created lazily by
/// [`ensure_collection`](Self::ensure_collection). Point ids are assigned by
/// cumulative position across upload batches, so a partially completed
/// [`build`](Self::build) leaves earlier batches searchable and never
/// overwrites them.
#[derive(Clone)]
pub struct QdrantIndex {
    client: reqwest::Client,
    base: String,
    collection: String,
}

impl QdrantIndex {
    /// Builds a new index handle for `collection`.
    pub fn new(
        base_url: Url,
        api_key: Option<&str>,
        collection: impl Into<String>,
    ) -> Result<Self, RagError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            headers.insert(
                "api-key",
                HeaderValue::from_str(key.trim()).map_err(|_| {
                    RagError::Config("Qdrant API key is not a valid header value".to_string())
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| RagError::Config(format!("failed to build Qdrant HTTP client: {err}")))?;

        Ok(Self {
            client,
            base: base_url.as_str().trim_end_matches('/').to_string(),
            collection: collection.into(),
        })
    }

    /// Name of the collection this handle targets.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Ensures the collection exists with the given dimension and cosine
    /// distance. Idempotent: an existing collection is left untouched, but
    /// its declared vector size is checked against `dim` so a mismatch
    /// fails here instead of as an opaque upsert error later.
    pub async fn ensure_collection(&self, dim: usize) -> Result<(), RagError> {
        let existing = self.list_collections().await?;
        if existing.iter().any(|name| name == &self.collection) {
            if let Some(declared) = self.collection_dim().await? {
                if declared != dim {
                    return Err(RagError::Config(format!(
                        "collection '{}' stores {declared}-dimensional vectors \
                         but the embedding model produces {dim}",
                        self.collection
                    )));
                }
            }
            return Ok(());
        }

        let url = format!("{}/collections/{}", self.base, self.collection);
        let body = CreateCollectionRequest {
            vectors: VectorParams {
                size: dim,
                distance: "Cosine",
            },
        };
        self.send_json::<serde_json::Value>(self.client.put(&url).json(&body), "create collection")
            .await?;
        tracing::info!(collection = %self.collection, dim, "created collection");
        Ok(())
    }

    /// Embeds `chunks` and uploads them in batches.
    ///
    /// Each batch is upserted immediately after it is embedded, and ids are
    /// assigned by cumulative position (`0..N-1` across the whole build), so
    /// a mid-build failure leaves a partially populated but internally
    /// consistent collection. Returns the number of uploaded chunks.
    pub async fn build(
        &self,
        chunks: &[String],
        provider: &dyn EmbeddingProvider,
    ) -> Result<usize, RagError> {
        let mut uploaded = 0usize;
        for batch in chunks.chunks(EMBED_BATCH_LIMIT) {
            let vectors = provider.embed_documents(batch).await?;
            let points: Vec<Point> = batch
                .iter()
                .zip(vectors)
                .enumerate()
                .map(|(offset, (text, vector))| Point {
                    id: (uploaded + offset) as u64,
                    vector,
                    payload: PointPayload { text: text.clone() },
                })
                .collect();
            self.upsert(points).await?;
            uploaded += batch.len();
            tracing::debug!(
                collection = %self.collection,
                uploaded,
                total = chunks.len(),
                "uploaded point batch"
            );
        }
        Ok(uploaded)
    }

    async fn upsert(&self, points: Vec<Point>) -> Result<(), RagError> {
        if points.is_empty() {
            return Ok(());
        }
        let url = format!("{}/collections/{}/points", self.base, self.collection);
        let body = UpsertRequest { points };
        self.send_json::<serde_json::Value>(self.client.put(&url).json(&body), "upsert points")
            .await?;
        Ok(())
    }

    /// K-nearest-neighbour search, ranked by descending cosine similarity.
    ///
    /// Returns fewer than `k` results when the collection holds fewer points.
    pub async fn knn(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        let url = format!("{}/collections/{}/points/search", self.base, self.collection);
        let body = SearchRequest {
            vector: query,
            limit: k,
            with_payload: true,
        };
        let response: SearchResponse = self
            .send_json(self.client.post(&url).json(&body), "search points")
            .await?;

        Ok(response
            .result
            .into_iter()
            .map(|hit| ScoredChunk {
                text: hit.payload.map(|payload| payload.text).unwrap_or_default(),
                score: hit.score,
            })
            .collect())
    }

    /// Cheap existence probe: scrolls at most one point.
    pub async fn has_any_entry(&self) -> Result<bool, RagError> {
        let url = format!("{}/collections/{}/points/scroll", self.base, self.collection);
        let body = ScrollRequest { limit: 1 };
        let response: ScrollResponse = self
            .send_json(self.client.post(&url).json(&body), "scroll points")
            .await?;
        Ok(!response.result.points.is_empty())
    }

    async fn list_collections(&self) -> Result<Vec<String>, RagError> {
        let url = format!("{}/collections", self.base);
        let response: CollectionsResponse = self
            .send_json(self.client.get(&url), "list collections")
            .await?;
        Ok(response
            .result
            .collections
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }

    /// Reads the declared vector size of the existing collection, when the
    /// store reports it in a shape we recognize.
    async fn collection_dim(&self) -> Result<Option<usize>, RagError> {
        let url = format!("{}/collections/{}", self.base, self.collection);
        let response: CollectionInfoResponse = self
            .send_json(self.client.get(&url), "read collection info")
            .await?;
        let declared = response
            .result
            .config
            .and_then(|config| config.params)
            .and_then(|params| params.vectors)
            .map(|vectors| vectors.size);
        if declared.is_none() {
            tracing::debug!(
                collection = %self.collection,
                "collection info did not report a vector size, skipping dimension check"
            );
        }
        Ok(declared)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T, RagError> {
        let response = request
            .send()
            .await
            .map_err(|err| RagError::VectorStore(format!("{context}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RagError::VectorStore(format!(
                "{context} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|err| RagError::VectorStore(format!("{context}: failed to parse response: {err}")))
    }
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct Point {
    id: u64,
    vector: Vec<f32>,
    payload: PointPayload,
}

#[derive(Serialize, Deserialize)]
struct PointPayload {
    text: String,
}

#[derive(Serialize)]
struct UpsertRequest {
    points: Vec<Point>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Serialize)]
struct ScrollRequest {
    limit: usize,
}

#[derive(Deserialize)]
struct CollectionsResponse {
    #[serde(default)]
    result: CollectionsResult,
}

#[derive(Deserialize, Default)]
struct CollectionsResult {
    #[serde(default)]
    collections: Vec<CollectionEntry>,
}

#[derive(Deserialize)]
struct CollectionEntry {
    name: String,
}

#[derive(Deserialize)]
struct CollectionInfoResponse {
    #[serde(default)]
    result: CollectionInfo,
}

#[derive(Deserialize, Default)]
struct CollectionInfo {
    #[serde(default)]
    config: Option<CollectionConfig>,
}

#[derive(Deserialize)]
struct CollectionConfig {
    #[serde(default)]
    params: Option<CollectionParams>,
}

#[derive(Deserialize)]
struct CollectionParams {
    #[serde(default)]
    vectors: Option<DeclaredVectorParams>,
}

#[derive(Deserialize)]
struct DeclaredVectorParams {
    size: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    score: f32,
    #[serde(default)]
    payload: Option<PointPayload>,
}

#[derive(Deserialize)]
struct ScrollResponse {
    #[serde(default)]
    result: ScrollResult,
}

#[derive(Deserialize, Default)]
struct ScrollResult {
    #[serde(default)]
    points: Vec<serde_json::Value>,
}
