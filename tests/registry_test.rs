//! DID registry client and assignment service against a mock registrar

use did_summarizer::cache::MemoryDidCache;
use did_summarizer::db::MemoryDocumentStore;
use did_summarizer::services::{
    DidAssignmentService, DidRegistry, HttpDidRegistry, RegistrationPayload, RegistryConfig,
    RegistrySecret,
};
use did_summarizer::ServiceError;
use serde_json::{json, Map};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn registry_for(server: &MockServer) -> HttpDidRegistry {
    HttpDidRegistry::new(RegistryConfig {
        base_url: server.uri(),
        request_timeout: Duration::from_secs(2),
    })
}

fn payload(uri: &str) -> RegistrationPayload {
    let mut metadata = Map::new();
    metadata.insert("uri".into(), json!(uri));
    RegistrationPayload::new(uri, metadata, RegistrySecret::new("doc-secret", "rev-secret"))
}

#[tokio::test]
async fn test_create_posts_payload_and_returns_did() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1.0/create"))
        .and(query_param("method", "oyd"))
        .and(body_partial_json(json!({
            "didDocument": {
                "@context": "http://example.org/v1",
                "metadata": {"uri": "http://example.org/v1"},
                "authentication": [],
                "service": []
            },
            "secret": {"doc_pwd": "doc-secret", "rev_pwd": "rev-secret"}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"didState": {"did": "did:test:123"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let did = registry_for(&server)
        .create(&payload("http://example.org/v1"))
        .await
        .unwrap();

    assert_eq!(did, "did:test:123");
}

#[tokio::test]
async fn test_error_status_is_upstream_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("registrar exploded"))
        .mount(&server)
        .await;

    let err = registry_for(&server)
        .create(&payload("http://example.org/v1"))
        .await
        .unwrap_err();

    match err {
        ServiceError::UpstreamUnavailable(message) => {
            assert!(message.contains("500"));
            assert!(message.contains("registrar exploded"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_response_without_did_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"didState": {"state": "failed"}})))
        .mount(&server)
        .await;

    let err = registry_for(&server)
        .create(&payload("http://example.org/v1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::MalformedUpstreamResponse(_)));
}

#[tokio::test]
async fn test_unreachable_registry() {
    let registry = HttpDidRegistry::new(RegistryConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        request_timeout: Duration::from_secs(2),
    });

    let err = registry.create(&payload("http://example.org/v1")).await.unwrap_err();
    assert!(matches!(err, ServiceError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn test_assignment_creates_once_through_http_registry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1.0/create"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"didState": {"did": "did:test:abc"}}))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryDidCache::new());
    let store = Arc::new(MemoryDocumentStore::new());
    let service = Arc::new(DidAssignmentService::new(
        cache.clone(),
        store.clone(),
        Arc::new(registry_for(&server)),
        RegistrySecret::new("doc", "rev"),
    ));

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.assign("http://example.org/shared", None).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "did:test:abc");
    }

    assert_eq!(cache.len(), 1);
    assert_eq!(store.records().await.len(), 1);
    server.verify().await;
}
