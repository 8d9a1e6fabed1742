//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo; one task per connection.

use bytes::Bytes;
use chrono_tz::Tz;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::cache::CachePartitions;
use crate::config::Args;
use crate::routes;
use crate::services::{DidAssignmentService, Recommender, Summarizer};
use crate::types::{Result, ServiceError};

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// URI -> DID assignment over the DID cache partition
    pub assignment: Arc<DidAssignmentService>,
    /// All four cache partitions, for health reporting
    pub partitions: CachePartitions,
    pub summarizer: Arc<dyn Summarizer>,
    pub recommender: Arc<dyn Recommender>,
    /// Parsed `TIMEZONE`
    pub time_zone: Tz,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        assignment: Arc<DidAssignmentService>,
        partitions: CachePartitions,
        summarizer: Arc<dyn Summarizer>,
        recommender: Arc<dyn Recommender>,
    ) -> Result<Self> {
        let time_zone = args.time_zone().map_err(ServiceError::Config)?;
        Ok(Self {
            args,
            assignment,
            partitions,
            summarizer,
            recommender,
            time_zone,
            started_at: Instant::now(),
        })
    }
}

/// Bind the configured address and serve forever
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;
    info!("did-summarizer listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - registry credentials not enforced");
    }

    serve(listener, state).await
}

/// Serve connections from an already bound listener
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let span = info_span!("request", id = %request_id, method = %method, path = %path);

    async move {
        info!(client = %addr, query = req.uri().query().unwrap_or(""), "Request received");
        let started = Instant::now();

        let result = route(&state, req).await;
        let mut response = match result {
            Ok(response) => response,
            Err(e) => {
                if e.status_code().is_server_error() {
                    error!(error = %e, "Request failed");
                } else {
                    warn!(error = %e, "Request rejected");
                }
                routes::error_response(e)
            }
        };

        if let Ok(value) = request_id.to_string().parse() {
            response.headers_mut().insert("X-Request-Id", value);
        }

        info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
        Ok(response)
    }
    .instrument(span)
    .await
}

async fn route(state: &AppState, req: Request<Incoming>) -> Result<Response<Full<Bytes>>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    match (method, path.as_str()) {
        (Method::OPTIONS, _) => Ok(preflight_response()),

        (Method::GET, "/") => Ok(routes::root_info()),
        (Method::GET, "/version") => Ok(routes::version_info()),
        (Method::GET, "/health") => Ok(routes::health_check(state).await),
        (Method::GET, "/openapi.json") => Ok(routes::openapi_document()),

        (Method::GET, "/cache") => routes::handle_get_cache(state, query.as_deref()).await,
        (Method::POST, "/cache") => {
            let body = read_body(req).await?;
            routes::handle_post_cache(state, &body).await
        }

        (Method::GET, "/summarizer") => routes::handle_summarizer(state, query.as_deref()).await,
        (Method::GET, "/recommend") => routes::handle_recommend(state, query.as_deref()).await,

        _ => Ok(not_found_response(&path)),
    }
}

async fn read_body(req: Request<Incoming>) -> Result<Bytes> {
    req.into_body()
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| ServiceError::BadRequest(format!("Failed to read request body: {}", e)))
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
        "hint": "See /openapi.json for available routes"
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
