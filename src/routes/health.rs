//! Health check endpoint
//!
//! `/health` is a liveness probe: it returns 200 whenever the process is
//! serving. Dependency state is reported in the body:
//!
//! - `status`: `online`, or `degraded` when the DID cache partition is
//!   unreachable
//! - `cache`: reachability of every Redis partition
//! - `assignment`: hit/miss/creation counters since startup

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::json_response;
use crate::cache::{CachePartition, PartitionHealth};
use crate::server::AppState;
use crate::services::AssignmentStats;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    /// `online` or `degraded`
    pub status: &'static str,
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    pub commit_full: &'static str,
    pub build_time: &'static str,
    pub service: &'static str,
    /// Seconds since the server started
    pub uptime: u64,
    pub timestamp: String,
    pub mode: &'static str,
    pub timezone: String,
    pub store: &'static str,
    pub cache: Vec<PartitionHealth>,
    pub assignment: AssignmentStats,
}

async fn build_health_response(state: &AppState) -> HealthResponse {
    let cache = state.partitions.health().await;
    let did_reachable = cache
        .iter()
        .any(|p| p.partition == CachePartition::Did && p.reachable);

    HealthResponse {
        healthy: true,
        status: if did_reachable { "online" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "did-summarizer",
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        timezone: state.args.timezone.clone(),
        store: state.assignment.store_backend(),
        cache,
        assignment: state.assignment.stats(),
    }
}

/// GET /health
pub async fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    let response = build_health_response(state).await;
    json_response(StatusCode::OK, &response)
}
