//! HTTP routes for did-summarizer

pub mod cache;
pub mod health;
pub mod info;
pub mod recommend;
pub mod summarizer;

pub use cache::{handle_get_cache, handle_post_cache};
pub use health::health_check;
pub use info::{openapi_document, root_info, version_info};
pub use recommend::handle_recommend;
pub use summarizer::handle_summarizer;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{Result, ServiceError};

/// Serialize `body` as a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    raw_json_response(status, json)
}

/// JSON response from pre-serialized bytes
pub fn raw_json_response(status: StatusCode, json: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(json.into()))
        .unwrap()
}

/// Render a service error as `{"error", "message"}`
pub fn error_response(err: ServiceError) -> Response<Full<Bytes>> {
    let (status, body) = err.into_status_code_and_body();
    raw_json_response(status, body)
}

/// Decode the query string into `T`
pub fn parse_query<T: DeserializeOwned>(query: Option<&str>) -> Result<T> {
    serde_urlencoded::from_str(query.unwrap_or(""))
        .map_err(|e| ServiceError::BadRequest(format!("Invalid query parameters: {}", e)))
}

/// Required, non-empty query parameter
pub fn require_param(value: Option<String>, name: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::BadRequest(format!("missing query parameter '{}'", name)))
}
