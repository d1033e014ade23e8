//! Batching behavior of the HTTP embedding client against a mock endpoint.

use httpmock::prelude::*;
use ragcore::embeddings::{EmbeddingProvider, HttpEmbedder};
use ragcore::types::RagError;
use url::Url;

fn embedder(server: &MockServer, dim: usize) -> HttpEmbedder {
    let endpoint = Url::parse(&server.url("/embed")).unwrap();
    HttpEmbedder::new(endpoint, "test-key", dim).unwrap()
}

/// One-dimensional vectors `[[start], [start+1], ..]` so each position is
/// identifiable in the combined result.
fn index_vectors(range: std::ops::Range<usize>) -> serde_json::Value {
    serde_json::to_value(range.map(|i| vec![i as f32]).collect::<Vec<_>>()).unwrap()
}

#[tokio::test]
async fn seventy_five_texts_issue_three_ordered_batches() {
    let server = MockServer::start_async().await;
    let texts: Vec<String> = (0..75).map(|i| format!("text-{i}")).collect();

    let first = server
        .mock_async(|when, then| {
            when.method(POST).path("/embed").body_contains("\"text-0\"");
            then.status(200).json_body(index_vectors(0..32));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST).path("/embed").body_contains("\"text-32\"");
            then.status(200).json_body(index_vectors(32..64));
        })
        .await;
    let third = server
        .mock_async(|when, then| {
            when.method(POST).path("/embed").body_contains("\"text-64\"");
            then.status(200).json_body(index_vectors(64..75));
        })
        .await;

    let vectors = embedder(&server, 1).embed_documents(&texts).await.unwrap();

    assert_eq!(vectors.len(), 75);
    for (i, vector) in vectors.iter().enumerate() {
        assert_eq!(vector, &vec![i as f32], "vector {i} out of order");
    }
    assert_eq!(first.hits_async().await, 1);
    assert_eq!(second.hits_async().await, 1);
    assert_eq!(third.hits_async().await, 1);
}

#[tokio::test]
async fn overridden_batch_limit_still_preserves_order() {
    let server = MockServer::start_async().await;
    let texts: Vec<String> = (0..5).map(|i| format!("item-{i}")).collect();

    for (marker, range) in [
        ("\"item-0\"", 0..2),
        ("\"item-2\"", 2..4),
        ("\"item-4\"", 4..5),
    ] {
        server
            .mock_async(move |when, then| {
                when.method(POST).path("/embed").body_contains(marker);
                then.status(200).json_body(index_vectors(range.clone()));
            })
            .await;
    }

    let vectors = embedder(&server, 1)
        .with_batch_limit(2)
        .embed_documents(&texts)
        .await
        .unwrap();

    let flattened: Vec<f32> = vectors.into_iter().map(|v| v[0]).collect();
    assert_eq!(flattened, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[tokio::test]
async fn empty_input_issues_no_requests() {
    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200).json_body(serde_json::json!([]));
        })
        .await;

    let vectors = embedder(&server, 1).embed_documents(&[]).await.unwrap();
    assert!(vectors.is_empty());
    assert_eq!(any.hits_async().await, 0);
}

#[tokio::test]
async fn response_cardinality_mismatch_is_an_embedding_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200).json_body(index_vectors(0..2));
        })
        .await;

    let texts: Vec<String> = (0..3).map(|i| format!("text-{i}")).collect();
    let err = embedder(&server, 1).embed_documents(&texts).await.unwrap_err();
    assert!(matches!(err, RagError::Embedding(_)));
}

#[tokio::test]
async fn unexpected_dimension_is_an_embedding_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200).json_body(index_vectors(0..1));
        })
        .await;

    let err = embedder(&server, 2)
        .embed_query("some query")
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Embedding(_)));
}

#[tokio::test]
async fn service_failure_is_an_embedding_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(503).body("upstream unavailable");
        })
        .await;

    let err = embedder(&server, 1)
        .embed_query("some query")
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Embedding(_)));
}
