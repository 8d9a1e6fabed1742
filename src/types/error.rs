//! Error types for did-summarizer
//!
//! Every failure a handler can surface maps onto one variant, and every
//! variant maps onto one HTTP status.

use hyper::StatusCode;

/// Main error type for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The DID registry or a vocabulary host could not be reached, or
    /// answered with a non-success status.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// An upstream answered, but not in the shape we rely on
    /// (e.g. a registry response without `didState.did`).
    #[error("Malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),

    #[error("Recommender error: {0}")]
    Recommender(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::MalformedUpstreamResponse(_) => StatusCode::BAD_GATEWAY,
            Self::Recommender(_) => StatusCode::BAD_GATEWAY,
            Self::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable name used in JSON error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BadRequest",
            Self::UpstreamUnavailable(_) => "UpstreamUnavailable",
            Self::MalformedUpstreamResponse(_) => "MalformedUpstreamResponse",
            Self::Recommender(_) => "Recommender",
            Self::Cache(_) => "Cache",
            Self::Database(_) => "Database",
            Self::Config(_) => "Config",
            Self::Internal(_) => "Internal",
        }
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, body.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for ServiceError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedUpstreamResponse(err.to_string())
        } else {
            Self::UpstreamUnavailable(err.to_string())
        }
    }
}

impl From<redis::RedisError> for ServiceError {
    fn from(err: redis::RedisError) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<mongodb::error::Error> for ServiceError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for ServiceError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Database(format!("BSON serialization failed: {}", err))
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_errors_map_to_bad_gateway() {
        assert_eq!(
            ServiceError::UpstreamUnavailable("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::MalformedUpstreamResponse("no didState".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_storage_errors_map_to_unavailable() {
        assert_eq!(
            ServiceError::Cache("refused".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServiceError::Database("timeout".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_error_body_is_json() {
        let (status, body) = ServiceError::BadRequest("missing uri".into()).into_status_code_and_body();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["error"], "BadRequest");
        assert_eq!(value["message"], "Bad request: missing uri");
    }
}
