use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use topical::config::EmbeddingConfig;
use topical::embedding::{EmbeddingError, EmbeddingProvider, RemoteProvider};

fn config_for(server: &MockServer, dimensions: usize, max_retries: usize) -> EmbeddingConfig {
    EmbeddingConfig {
        endpoint: format!("{}/embed", server.uri()),
        dimensions,
        timeout_secs: 5,
        max_retries,
        ..EmbeddingConfig::default()
    }
}

#[tokio::test]
async fn flat_vector_response_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .and(body_json(json!({"inputs": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([0.1, 0.2, 0.3])))
        .mount(&server)
        .await;

    let provider = RemoteProvider::new(&config_for(&server, 3, 1)).unwrap();
    let vector = provider.embed("hello").await.unwrap();
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn batch_of_one_is_unwrapped_to_a_flat_vector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[0.5, 0.5, 0.0]])))
        .mount(&server)
        .await;

    let provider = RemoteProvider::new(&config_for(&server, 3, 1)).unwrap();
    let vector = provider.embed("hello").await.unwrap();
    assert_eq!(vector, vec![0.5, 0.5, 0.0]);
}

#[tokio::test]
async fn client_error_status_surfaces_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(422).set_body_string("input too long"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = RemoteProvider::new(&config_for(&server, 3, 3)).unwrap();
    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Status { .. }));
    assert!(err.to_string().contains("input too long"));
}

#[tokio::test]
async fn dimension_mismatch_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([0.1, 0.2, 0.3])))
        .mount(&server)
        .await;

    let provider = RemoteProvider::new(&config_for(&server, 384, 1)).unwrap();
    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(
        err,
        EmbeddingError::DimensionMismatch {
            expected: 384,
            actual: 3
        }
    ));
}

#[tokio::test]
async fn malformed_payload_is_an_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"weird": true})))
        .mount(&server)
        .await;

    let provider = RemoteProvider::new(&config_for(&server, 3, 1)).unwrap();
    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
}

#[tokio::test]
async fn empty_batch_is_an_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[]])))
        .mount(&server)
        .await;

    let provider = RemoteProvider::new(&config_for(&server, 3, 1)).unwrap();
    // A batch of one empty vector parses, then fails the dimension check.
    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::DimensionMismatch { .. }));
}

#[tokio::test]
async fn transient_server_error_is_retried_until_success() {
    let server = MockServer::start().await;
    // First attempt gets a 500, the retry succeeds. Mount order matters:
    // the exhausted mock falls through to the success mock.
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1.0, 0.0, 0.0])))
        .expect(1)
        .mount(&server)
        .await;

    let provider = RemoteProvider::new(&config_for(&server, 3, 3)).unwrap();
    let vector = provider.embed("hello").await.unwrap();
    assert_eq!(vector, vec![1.0, 0.0, 0.0]);
}

#[tokio::test]
async fn retries_are_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let provider = RemoteProvider::new(&config_for(&server, 3, 2)).unwrap();
    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Status { .. }));
}
