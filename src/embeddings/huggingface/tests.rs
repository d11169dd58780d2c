use super::*;
use crate::config::{Config, IndexConfig, ServiceConfig};
use serde_json::json;
use std::path::PathBuf;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(api_base: &str, dimension: u32, batch_size: u32) -> Config {
    Config {
        service: ServiceConfig {
            api_base: api_base.to_string(),
            embedding_model: "test-model".to_string(),
            embedding_dimension: dimension,
            batch_size,
            ..ServiceConfig::default()
        },
        index: IndexConfig::default(),
        base_dir: PathBuf::new(),
    }
}

fn test_client(server_uri: &str, dimension: u32, batch_size: u32) -> HfEmbeddingClient {
    HfEmbeddingClient::new(&test_config(server_uri, dimension, batch_size))
        .expect("should build client")
        .with_retry_attempts(1)
}

async fn embed_blocking(
    client: HfEmbeddingClient,
    texts: Vec<String>,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    tokio::task::spawn_blocking(move || client.embed(&texts))
        .await
        .expect("embedding task should join")
}

#[tokio::test(flavor = "multi_thread")]
async fn embeds_texts_in_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pipeline/feature-extraction/test-model"))
        .and(body_json(json!({ "inputs": ["first", "second"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[1.0, 0.0], [0.0, 1.0]])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2, 16);
    let vectors = embed_blocking(client, vec!["first".to_string(), "second".to_string()])
        .await
        .expect("should embed");

    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test(flavor = "multi_thread")]
async fn splits_requests_by_batch_size() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pipeline/feature-extraction/test-model"))
        .and(body_json(json!({ "inputs": ["a", "b"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[1.0, 0.0], [0.0, 1.0]])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/pipeline/feature-extraction/test-model"))
        .and(body_json(json!({ "inputs": ["c"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[0.5, 0.5]])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2, 2);
    let vectors = embed_blocking(
        client,
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
    )
    .await
    .expect("should embed across batches");

    assert_eq!(vectors.len(), 3);
    assert_eq!(vectors[2], vec![0.5, 0.5]);
}

#[tokio::test(flavor = "multi_thread")]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2, 16).with_retry_attempts(3);
    let result = embed_blocking(client, vec!["text".to_string()]).await;

    assert!(matches!(result, Err(EmbeddingError::Status(404))));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejects_wrong_vector_dimension() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[1.0, 2.0, 3.0]])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2, 16);
    let result = embed_blocking(client, vec!["text".to_string()]).await;

    assert!(matches!(
        result,
        Err(EmbeddingError::DimensionMismatch {
            expected: 2,
            actual: 3
        })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejects_mismatched_vector_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[1.0, 0.0]])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2, 16);
    let result = embed_blocking(client, vec!["one".to_string(), "two".to_string()]).await;

    assert!(matches!(
        result,
        Err(EmbeddingError::CountMismatch {
            sent: 2,
            received: 1
        })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_input_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2, 16);
    let vectors = embed_blocking(client, Vec::new())
        .await
        .expect("empty input should succeed");

    assert!(vectors.is_empty());
}
