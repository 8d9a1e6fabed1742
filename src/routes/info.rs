//! Informational endpoints: `/`, `/version` and `/openapi.json`

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde_json::{json, Value};

use super::json_response;

pub const SERVICE_TITLE: &str = "CLARIAH Linked Data Summarizer";
pub const PROJECT_URL: &str = "https://github.com/Dans-labs/did-summarizer";

/// `<major>.<minor>` of the package version
pub fn short_version() -> String {
    format!(
        "{}.{}",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR")
    )
}

/// GET /
pub fn root_info() -> Response<Full<Bytes>> {
    let text = format!(
        "CLARIAH Vocabulary Summarizer v.{} {}",
        short_version(),
        PROJECT_URL
    );
    json_response(StatusCode::OK, &text)
}

/// GET /version
pub fn version_info() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &short_version())
}

/// GET /openapi.json
pub fn openapi_document() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &openapi_spec())
}

fn query_param(name: &str, required: bool, description: &str) -> Value {
    json!({
        "name": name,
        "in": "query",
        "required": required,
        "description": description,
        "schema": { "type": "string" }
    })
}

fn json_ok(description: &str, schema: Value) -> Value {
    json!({
        "200": {
            "description": description,
            "content": { "application/json": { "schema": schema } }
        },
        "400": { "description": "Missing or invalid parameters" },
        "502": { "description": "Upstream service failed" }
    })
}

/// OpenAPI 3 description of the public API
pub fn openapi_spec() -> Value {
    json!({
        "openapi": "3.0.2",
        "info": {
            "title": SERVICE_TITLE,
            "description": "Service to support Linked Open Data tasks.",
            "version": short_version()
        },
        "tags": [
            {
                "name": "country",
                "externalDocs": {
                    "description": "Put this citation in working papers and published papers that use this dataset.",
                    "authors": "Slava Tykhonov",
                    "url": "https://dans.knaw.nl/en"
                }
            },
            {
                "name": "namespace",
                "externalDocs": {
                    "description": "API endpoint for specific tasks.",
                    "authors": "Slava Tykhonov",
                    "url": "https://dans.knaw.nl"
                }
            }
        ],
        "paths": {
            "/": {
                "get": {
                    "summary": "Service information",
                    "responses": json_ok("Service banner", json!({ "type": "string" }))
                }
            },
            "/version": {
                "get": {
                    "summary": "Service version",
                    "responses": json_ok("Major and minor version", json!({ "type": "string" }))
                }
            },
            "/cache": {
                "get": {
                    "summary": "DID assigned to a URI, created on first request",
                    "parameters": [
                        query_param("uri", true, "Resource URI"),
                        query_param("token", false, "Accepted and ignored")
                    ],
                    "responses": json_ok("The DID", json!({ "type": "string" }))
                },
                "post": {
                    "summary": "DIDs for a list of URIs",
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "url": { "type": "array", "items": { "type": "string" } }
                                    }
                                }
                            }
                        }
                    },
                    "responses": json_ok(
                        "URI to DID map",
                        json!({ "type": "object", "additionalProperties": { "type": "string" } })
                    )
                }
            },
            "/summarizer": {
                "get": {
                    "tags": ["namespace"],
                    "summary": "Namespace statistics of a Linked Data vocabulary",
                    "parameters": [
                        query_param("url", true, "Vocabulary URL"),
                        query_param("token", false, "Accepted and ignored"),
                        query_param("persist", false, "Register the summary with the URL's DID")
                    ],
                    "responses": json_ok(
                        "Statements, prefixes and stats",
                        json!({
                            "type": "object",
                            "properties": {
                                "statements": { "type": "integer" },
                                "prefixes": { "type": "object" },
                                "stats": { "type": "object" },
                                "date": { "type": "string" },
                                "timezone": { "type": "string" },
                                "did": { "type": "string" }
                            }
                        })
                    )
                }
            },
            "/recommend": {
                "get": {
                    "tags": ["namespace"],
                    "summary": "Vocabulary term recommendations",
                    "parameters": [
                        query_param("searchTerm", true, "Term to look up"),
                        query_param("searchClass", false, "Restrict to a class"),
                        query_param("endpoint", false, "SPARQL endpoint to query")
                    ],
                    "responses": json_ok("Recommender output, or false", json!({}))
                }
            },
            "/health": {
                "get": {
                    "summary": "Liveness and dependency status",
                    "responses": json_ok("Health report", json!({ "type": "object" }))
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_version() {
        assert_eq!(short_version(), "0.1");
    }

    #[test]
    fn test_openapi_lists_every_route() {
        let spec = openapi_spec();
        assert_eq!(spec["info"]["title"], SERVICE_TITLE);
        for path in ["/", "/version", "/cache", "/summarizer", "/recommend", "/health"] {
            assert!(spec["paths"].get(path).is_some(), "missing {}", path);
        }
        assert!(spec["paths"]["/cache"].get("post").is_some());
        assert_eq!(spec["tags"][1]["name"], "namespace");
    }
}
