//! QdrantIndex behavior against a mocked collection REST API.

use httpmock::prelude::*;
use ragcore::embeddings::MockEmbeddingProvider;
use ragcore::stores::QdrantIndex;
use ragcore::types::RagError;
use serde_json::json;
use url::Url;

fn index(server: &MockServer) -> QdrantIndex {
    QdrantIndex::new(
        Url::parse(&server.base_url()).unwrap(),
        Some("test-key"),
        "documents",
    )
    .unwrap()
}

async fn mock_collections_listing(server: &MockServer, names: &[&str]) {
    let collections: Vec<_> = names.iter().map(|name| json!({ "name": name })).collect();
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/collections");
            then.status(200)
                .json_body(json!({ "result": { "collections": collections } }));
        })
        .await;
}

#[tokio::test]
async fn ensure_collection_creates_missing_collection() {
    let server = MockServer::start_async().await;
    mock_collections_listing(&server, &[]).await;
    let create = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/collections/documents")
                .body_contains("\"size\":1536")
                .body_contains("\"distance\":\"Cosine\"");
            then.status(200).json_body(json!({ "result": true }));
        })
        .await;

    index(&server).ensure_collection(1536).await.unwrap();
    assert_eq!(create.hits_async().await, 1);
}

#[tokio::test]
async fn ensure_collection_leaves_existing_collection_untouched() {
    let server = MockServer::start_async().await;
    mock_collections_listing(&server, &["documents"]).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/collections/documents");
            then.status(200).json_body(json!({
                "result": { "config": { "params": { "vectors": { "size": 1536 } } } }
            }));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(PUT).path("/collections/documents");
            then.status(200).json_body(json!({ "result": true }));
        })
        .await;

    index(&server).ensure_collection(1536).await.unwrap();
    assert_eq!(create.hits_async().await, 0);
}

#[tokio::test]
async fn ensure_collection_rejects_dimension_mismatch() {
    let server = MockServer::start_async().await;
    mock_collections_listing(&server, &["documents"]).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/collections/documents");
            then.status(200).json_body(json!({
                "result": { "config": { "params": { "vectors": { "size": 768 } } } }
            }));
        })
        .await;

    let err = index(&server).ensure_collection(1536).await.unwrap_err();
    assert!(matches!(err, RagError::Config(_)));
}

#[tokio::test]
async fn build_assigns_globally_unique_ids_across_batches() {
    let server = MockServer::start_async().await;
    let chunks: Vec<String> = (0..100).map(|i| format!("chunk {i}")).collect();

    let mut batch_mocks = Vec::new();
    for first_id in ["\"id\":0,", "\"id\":32,", "\"id\":64,", "\"id\":96,"] {
        let mock = server
            .mock_async(move |when, then| {
                when.method(PUT)
                    .path("/collections/documents/points")
                    .body_contains(first_id);
                then.status(200)
                    .json_body(json!({ "result": { "status": "acknowledged" } }));
            })
            .await;
        batch_mocks.push(mock);
    }

    let provider = MockEmbeddingProvider::with_dim(4);
    let uploaded = index(&server).build(&chunks, &provider).await.unwrap();

    assert_eq!(uploaded, 100);
    for mock in &batch_mocks {
        assert_eq!(mock.hits_async().await, 1);
    }
}

#[tokio::test]
async fn failed_batch_leaves_earlier_batches_uploaded() {
    let server = MockServer::start_async().await;
    let chunks: Vec<String> = (0..40).map(|i| format!("chunk {i}")).collect();

    let ok = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/collections/documents/points")
                .body_contains("\"id\":0,");
            then.status(200)
                .json_body(json!({ "result": { "status": "acknowledged" } }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/collections/documents/points")
                .body_contains("\"id\":32,");
            then.status(500).body("write failed");
        })
        .await;

    let provider = MockEmbeddingProvider::with_dim(4);
    let err = index(&server).build(&chunks, &provider).await.unwrap_err();

    assert!(matches!(err, RagError::VectorStore(_)));
    assert_eq!(ok.hits_async().await, 1);
}

#[tokio::test]
async fn knn_returns_available_entries_ranked_by_score() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/collections/documents/points/search")
                .body_contains("\"limit\":4")
                .body_contains("\"with_payload\":true");
            then.status(200).json_body(json!({
                "result": [
                    { "score": 0.91, "payload": { "text": "closest" } },
                    { "score": 0.72, "payload": { "text": "second" } },
                    { "score": 0.55, "payload": { "text": "third" } },
                ]
            }));
        })
        .await;

    let hits = index(&server).knn(&[0.1, 0.2, 0.3, 0.4], 4).await.unwrap();

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].text, "closest");
    assert!(hits.windows(2).all(|pair| pair[0].score >= pair[1].score));
}

#[tokio::test]
async fn existence_probe_scrolls_a_single_point() {
    let server = MockServer::start_async().await;
    let empty_server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/collections/documents/points/scroll")
                .body_contains("\"limit\":1");
            then.status(200)
                .json_body(json!({ "result": { "points": [ { "id": 0 } ] } }));
        })
        .await;
    empty_server
        .mock_async(|when, then| {
            when.method(POST).path("/collections/documents/points/scroll");
            then.status(200).json_body(json!({ "result": { "points": [] } }));
        })
        .await;

    assert!(index(&server).has_any_entry().await.unwrap());
    assert!(!index(&empty_server).has_any_entry().await.unwrap());
}
