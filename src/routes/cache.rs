//! DID cache endpoints
//!
//! - `GET /cache?uri=<URI>` returns the DID for one URI as a JSON string
//! - `POST /cache` with `{"url": [...]}` returns a URI -> DID object

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{json_response, parse_query, require_param};
use crate::server::AppState;
use crate::types::{Result, ServiceError};

#[derive(Debug, Deserialize)]
pub struct CacheQuery {
    pub uri: Option<String>,
    /// Accepted for compatibility; not checked
    #[allow(dead_code)]
    pub token: Option<String>,
}

/// GET /cache
pub async fn handle_get_cache(state: &AppState, query: Option<&str>) -> Result<Response<Full<Bytes>>> {
    let params: CacheQuery = parse_query(query)?;
    let uri = require_param(params.uri, "uri")?;

    let did = state.assignment.assign(&uri, None).await?;
    Ok(json_response(StatusCode::OK, &did))
}

/// Body shape accepted by `POST /cache`
#[derive(Debug, PartialEq)]
pub enum BatchRequest {
    Urls(Vec<String>),
    /// No `url` key: echoed back
    Other(String),
}

/// Interpret a `POST /cache` body
pub fn parse_batch_body(body: &[u8]) -> Result<BatchRequest> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ServiceError::BadRequest(format!("body is not JSON: {}", e)))?;

    let url = match value.as_object().and_then(|o| o.get("url")) {
        Some(url) => url,
        None => return Ok(BatchRequest::Other(String::from_utf8_lossy(body).into_owned())),
    };

    match url {
        Value::String(single) => Ok(BatchRequest::Urls(vec![single.clone()])),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ServiceError::BadRequest("'url' entries must be non-empty strings".into())
                    })
            })
            .collect::<Result<Vec<_>>>()
            .map(BatchRequest::Urls),
        _ => Err(ServiceError::BadRequest(
            "'url' must be a string or an array of strings".into(),
        )),
    }
}

/// POST /cache
pub async fn handle_post_cache(state: &AppState, body: &Bytes) -> Result<Response<Full<Bytes>>> {
    match parse_batch_body(body)? {
        BatchRequest::Urls(urls) => {
            debug!(count = urls.len(), "Batch DID assignment");
            let dids = state.assignment.assign_batch(&urls).await?;
            Ok(json_response(StatusCode::OK, &dids))
        }
        BatchRequest::Other(raw) => Ok(json_response(
            StatusCode::OK,
            &serde_json::json!({ "message": format!("You wrote: {}", raw) }),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_list() {
        assert_eq!(
            parse_batch_body(br#"{"url": ["http://a.example/", "http://b.example/"]}"#).unwrap(),
            BatchRequest::Urls(vec!["http://a.example/".into(), "http://b.example/".into()])
        );
    }

    #[test]
    fn test_single_url_string_is_one_element_list() {
        assert_eq!(
            parse_batch_body(br#"{"url": "http://a.example/"}"#).unwrap(),
            BatchRequest::Urls(vec!["http://a.example/".into()])
        );
    }

    #[test]
    fn test_body_without_url_is_echoed() {
        assert_eq!(
            parse_batch_body(br#"{"foo": "bar"}"#).unwrap(),
            BatchRequest::Other(r#"{"foo": "bar"}"#.into())
        );
        assert_eq!(
            parse_batch_body(b"[1, 2]").unwrap(),
            BatchRequest::Other("[1, 2]".into())
        );
    }

    #[test]
    fn test_invalid_bodies() {
        assert!(matches!(parse_batch_body(b"not json"), Err(ServiceError::BadRequest(_))));
        assert!(matches!(parse_batch_body(br#"{"url": 5}"#), Err(ServiceError::BadRequest(_))));
        assert!(matches!(
            parse_batch_body(br#"{"url": ["ok", 7]}"#),
            Err(ServiceError::BadRequest(_))
        ));
    }
}
