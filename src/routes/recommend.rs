//! Vocabulary recommendation endpoint
//!
//! `GET /recommend?searchTerm=<s>&searchClass=<c>&endpoint=<e>` proxies to
//! the recommender CLI. The tool's JSON is returned with four-space
//! indentation; when it printed none the body is `false`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Deserialize;

use super::{json_response, parse_query, raw_json_response, require_param};
use crate::server::AppState;
use crate::services::{to_pretty_json, RecommendQuery};
use crate::types::Result;

#[derive(Debug, Deserialize)]
pub struct RecommendParams {
    #[serde(rename = "searchTerm")]
    pub search_term: Option<String>,
    #[serde(rename = "searchClass")]
    pub search_class: Option<String>,
    pub endpoint: Option<String>,
}

impl RecommendParams {
    pub fn into_query(self) -> Result<RecommendQuery> {
        Ok(RecommendQuery {
            search_term: require_param(self.search_term, "searchTerm")?,
            search_class: self.search_class.filter(|c| !c.is_empty()),
            endpoint: self.endpoint.filter(|e| !e.is_empty()),
        })
    }
}

/// GET /recommend
pub async fn handle_recommend(state: &AppState, query: Option<&str>) -> Result<Response<Full<Bytes>>> {
    let params: RecommendParams = parse_query(query)?;
    let query = params.into_query()?;

    match state.recommender.recommend(&query).await? {
        Some(payload) => Ok(raw_json_response(StatusCode::OK, to_pretty_json(&payload)?)),
        None => Ok(json_response(StatusCode::OK, &false)),
    }
}
