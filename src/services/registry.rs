//! DID Registry client
//!
//! Mints new DIDs through an external DID registrar. The registrar speaks the
//! universal-registrar style `create` API:
//!
//! ```text
//! POST {base}/1.0/create?method=oyd
//! {"didDocument": {"@context": uri, "metadata": {...},
//!                  "authentication": [], "service": []},
//!  "secret": {"doc_pwd": ..., "rev_pwd": ...}}
//!
//! → {"didState": {"did": "did:oyd:..."}, ...}
//! ```
//!
//! A single attempt is made per call; there is no retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::types::{Result, ServiceError};

/// Path and DID method appended to the registry base URL
pub const CREATE_PATH: &str = "1.0/create?method=oyd";

/// Credentials forwarded to the registry so the minted document can later be
/// updated or revoked. Always sourced from process configuration.
#[derive(Clone, Serialize, Zeroize, ZeroizeOnDrop)]
pub struct RegistrySecret {
    doc_pwd: String,
    rev_pwd: String,
}

impl RegistrySecret {
    pub fn new(doc_pwd: impl Into<String>, rev_pwd: impl Into<String>) -> Self {
        Self {
            doc_pwd: doc_pwd.into(),
            rev_pwd: rev_pwd.into(),
        }
    }
}

impl std::fmt::Debug for RegistrySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RegistrySecret(<redacted>)")
    }
}

/// The `didDocument` part of a registration
#[derive(Debug, Clone, Serialize)]
pub struct DidDocumentPayload {
    #[serde(rename = "@context")]
    pub context: String,
    pub metadata: Map<String, Value>,
    pub authentication: Vec<Value>,
    pub service: Vec<Value>,
}

/// Full body sent to the registry's create endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationPayload {
    #[serde(rename = "didDocument")]
    pub did_document: DidDocumentPayload,
    pub secret: RegistrySecret,
}

impl RegistrationPayload {
    /// Build the payload for `uri` with already-merged metadata
    pub fn new(uri: &str, metadata: Map<String, Value>, secret: RegistrySecret) -> Self {
        Self {
            did_document: DidDocumentPayload {
                context: uri.to_string(),
                metadata,
                authentication: Vec::new(),
                service: Vec::new(),
            },
            secret,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(rename = "didState")]
    did_state: Option<DidState>,
}

#[derive(Debug, Deserialize)]
struct DidState {
    did: Option<String>,
}

/// Extract `didState.did` from a registry response body
pub fn extract_did(body: &[u8]) -> Result<String> {
    let response: CreateResponse = serde_json::from_slice(body).map_err(|e| {
        ServiceError::MalformedUpstreamResponse(format!("registry response is not JSON: {}", e))
    })?;

    response
        .did_state
        .and_then(|state| state.did)
        .filter(|did| !did.is_empty())
        .ok_or_else(|| {
            ServiceError::MalformedUpstreamResponse(
                "registry response has no didState.did".to_string(),
            )
        })
}

/// Anything that can mint a DID from a registration payload
#[async_trait]
pub trait DidRegistry: Send + Sync {
    async fn create(&self, payload: &RegistrationPayload) -> Result<String>;
}

/// Configuration for the HTTP registry client
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry base URL (e.g. `https://oydid.example.org`)
    pub base_url: String,
    /// Timeout for HTTP requests (default: 30 seconds)
    pub request_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the external DID registrar
pub struct HttpDidRegistry {
    create_url: String,
    http_client: reqwest::Client,
}

impl HttpDidRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("did-summarizer/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            create_url: create_url(&config.base_url),
            http_client,
        }
    }

    pub fn create_url(&self) -> &str {
        &self.create_url
    }
}

#[async_trait]
impl DidRegistry for HttpDidRegistry {
    async fn create(&self, payload: &RegistrationPayload) -> Result<String> {
        let metadata = Value::Object(payload.did_document.metadata.clone());
        debug!(
            url = %self.create_url,
            context = %payload.did_document.context,
            metadata = %metadata,
            "Requesting DID from registry"
        );

        let response = self
            .http_client
            .post(&self.create_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ServiceError::UpstreamUnavailable(format!("DID registry: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ServiceError::UpstreamUnavailable(format!("DID registry: {}", e)))?;

        if !status.is_success() {
            let excerpt: String = String::from_utf8_lossy(&body).chars().take(200).collect();
            return Err(ServiceError::UpstreamUnavailable(format!(
                "DID registry returned HTTP {}: {}",
                status, excerpt
            )));
        }

        let did = extract_did(&body)?;
        debug!(did = %did, "DID minted");
        Ok(did)
    }
}

fn create_url(base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), CREATE_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_url() {
        assert_eq!(
            create_url("https://registry.example.org/"),
            "https://registry.example.org/1.0/create?method=oyd"
        );
        assert_eq!(
            create_url("http://localhost:3000"),
            "http://localhost:3000/1.0/create?method=oyd"
        );
    }

    #[test]
    fn test_payload_shape() {
        let mut metadata = Map::new();
        metadata.insert("uri".into(), json!("http://example.org/v1"));

        let payload = RegistrationPayload::new(
            "http://example.org/v1",
            metadata,
            RegistrySecret::new("doc", "rev"),
        );

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "didDocument": {
                    "@context": "http://example.org/v1",
                    "metadata": {"uri": "http://example.org/v1"},
                    "authentication": [],
                    "service": []
                },
                "secret": {"doc_pwd": "doc", "rev_pwd": "rev"}
            })
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let payload = RegistrationPayload::new("u", Map::new(), RegistrySecret::new("doc", "rev"));
        let rendered = format!("{:?}", payload);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("\"rev\""));
    }

    #[test]
    fn test_extract_did() {
        let body = br#"{"didState":{"did":"did:oyd:zQm123","state":"finished"}}"#;
        assert_eq!(extract_did(body).unwrap(), "did:oyd:zQm123");
    }

    #[test]
    fn test_extract_did_missing_field() {
        let err = extract_did(br#"{"didState":{"state":"failed"}}"#).unwrap_err();
        assert!(matches!(err, ServiceError::MalformedUpstreamResponse(_)));

        let err = extract_did(br#"{"error":"nope"}"#).unwrap_err();
        assert!(matches!(err, ServiceError::MalformedUpstreamResponse(_)));

        let err = extract_did(b"<html>502</html>").unwrap_err();
        assert!(matches!(err, ServiceError::MalformedUpstreamResponse(_)));
    }
}
