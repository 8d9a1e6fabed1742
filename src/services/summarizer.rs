//! Vocabulary summarizer
//!
//! Fetches a Linked Data document and computes its namespace summary.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::{debug, info};

use crate::namespaces::{self, Summary};
use crate::types::{Result, ServiceError};

/// Content types preferred when fetching vocabularies
pub const RDF_ACCEPT: &str =
    "text/turtle, application/rdf+xml;q=0.9, application/n-triples;q=0.8, */*;q=0.1";

/// Anything that can summarize the document behind a URL
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, url: &str) -> Result<Summary>;
}

/// Summarizer that fetches over HTTP
pub struct NamespaceSummarizer {
    http_client: reqwest::Client,
}

impl NamespaceSummarizer {
    pub fn new(request_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("did-summarizer/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self { http_client }
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, RDF_ACCEPT)
            .send()
            .await
            .map_err(|e| ServiceError::UpstreamUnavailable(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::UpstreamUnavailable(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ServiceError::UpstreamUnavailable(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl Summarizer for NamespaceSummarizer {
    async fn summarize(&self, url: &str) -> Result<Summary> {
        if reqwest::Url::parse(url).is_err() {
            return Err(ServiceError::BadRequest(format!("not an absolute URL: {}", url)));
        }

        let body = self.fetch(url).await?;
        debug!(url = url, bytes = body.len(), "Vocabulary fetched");

        let summary = namespaces::summarize(&body)?;
        info!(
            url = url,
            format = ?summary.stats.format,
            statements = summary.statements,
            namespaces = summary.stats.namespaces,
            "Vocabulary summarized"
        );
        Ok(summary)
    }
}
