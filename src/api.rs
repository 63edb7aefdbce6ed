//! REST gateway for HashLedger
//!
//! Maps HTTP requests onto [`Ledger`] operations:
//!
//! | Route                     | Operation                      |
//! |---------------------------|--------------------------------|
//! | `GET  /api/blocks`        | list all blocks                |
//! | `POST /api/blocks`        | append a block (201)           |
//! | `GET  /api/blocks/verify` | verify the chain               |
//! | `GET  /api/blocks/:id`    | fetch one block                |
//! | `PUT  /api/blocks/:id`    | overwrite a payload (tamper)   |
//! | `GET  /api/health`        | node health                    |
//! | `GET  /api/stats`         | request counters               |
//!
//! The tamper route is unauthenticated on purpose: it is the demonstration
//! hook for the verifier.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Request, State,
    },
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use crate::blockchain::{Block, VerificationReport};
use crate::error::ChainError;
use crate::ledger::Ledger;
use crate::node::NodeState;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct Node {
    pub ledger: Arc<Ledger>,
    // Optional orchestrator state for health checks and logging
    pub state: Option<Arc<RwLock<NodeState>>>,
    api_stats: Arc<RwLock<ApiStats>>,
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    blocks_appended: u64,
    blocks_tampered: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

impl Node {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self::new_shared(ledger, None)
    }

    /// Create an API node observing the orchestrator's lifecycle state.
    pub fn new_shared(ledger: Arc<Ledger>, state: Option<Arc<RwLock<NodeState>>>) -> Self {
        Self {
            ledger,
            state,
            api_stats: Arc::new(RwLock::new(ApiStats::new())),
        }
    }

    pub async fn get_stats(&self) -> ApiStatsResponse {
        let stats = self.api_stats.read().await;
        let uptime = stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

        ApiStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            failed_requests: stats.failed_requests,
            blocks_appended: stats.blocks_appended,
            blocks_tampered: stats.blocks_tampered,
            uptime_seconds: uptime,
            total_blocks: self.ledger.len(),
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Ledger(ChainError),
    /// The request could not be extracted (bad JSON, wrong content type,
    /// non-numeric id).
    BadRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(ChainError::InvalidInput(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Ledger(ChainError::Forbidden(_)) => StatusCode::FORBIDDEN,
            ApiError::Ledger(ChainError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Ledger(e) => e.to_string(),
            ApiError::BadRequest(msg) => msg,
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "api.error");
        } else {
            tracing::warn!(status = status.as_u16(), error = %message, "api.rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of both `POST /api/blocks` and `PUT /api/blocks/:id`.
///
/// A missing or null `data` field reads as empty and is rejected by
/// validation.
#[derive(Debug, Deserialize)]
pub struct BlockDataRequest {
    #[serde(default)]
    pub data: Option<String>,
}

impl BlockDataRequest {
    pub fn data(&self) -> &str {
        self.data.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub blocks_appended: u64,
    pub blocks_tampered: u64,
    pub uptime_seconds: u64,
    pub total_blocks: usize,
}

// ============================================================================
// Middleware
// ============================================================================

/// Request statistics middleware
async fn stats_middleware(State(node): State<Arc<Node>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    node.api_stats.write().await.record_request(success);

    response
}

/// Logs method, path, status, duration and the current `NodeState`.
async fn logging_middleware(
    State(node): State<Arc<Node>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let node_state = match &node.state {
        Some(s) => format!("{:?}", *s.read().await),
        None => "unknown".to_string(),
    };

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        node_state = %node_state,
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints.
pub fn build_api_router(node: Arc<Node>) -> Router {
    // The demo frontend may be served from any origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    let api_routes = Router::new()
        // Ledger endpoints
        .route("/blocks", get(list_blocks).post(add_block))
        .route("/blocks/verify", get(verify_chain))
        .route("/blocks/:id", get(get_block).put(modify_block))
        // System endpoints
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        // logging before stats so we always record timing and node-state
        .layer(middleware::from_fn_with_state(node.clone(), logging_middleware))
        .layer(middleware::from_fn_with_state(node.clone(), stats_middleware))
        .with_state(node);

    Router::new().nest("/api", api_routes).layer(cors)
}

/// Serve the API on an already bound listener until `shutdown` resolves.
pub async fn run_api_server<F>(
    node: Arc<Node>,
    listener: TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_api_router(node);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("API server listening on http://{}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let state = match &node.state {
        Some(s) => s.read().await.clone(),
        // No orchestrator state: embedded router, report healthy
        None => NodeState::Ready,
    };

    let (status, label) = if state == NodeState::Ready {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        status,
        Json(serde_json::json!({
            "status": label,
            "node_state": format!("{:?}", state),
            "blocks": node.ledger.len(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}

async fn list_blocks(State(node): State<Arc<Node>>) -> Json<Vec<Block>> {
    Json(node.ledger.get_all())
}

async fn get_block(
    State(node): State<Arc<Node>>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Block>, ApiError> {
    let Path(id) = id?;
    Ok(Json(node.ledger.get(id)?))
}

async fn add_block(
    State(node): State<Arc<Node>>,
    req: Result<Json<BlockDataRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Block>), ApiError> {
    let Json(req) = req?;
    let block = node.ledger.append(req.data())?;
    node.api_stats.write().await.blocks_appended += 1;
    Ok((StatusCode::CREATED, Json(block)))
}

async fn modify_block(
    State(node): State<Arc<Node>>,
    id: Result<Path<u64>, PathRejection>,
    req: Result<Json<BlockDataRequest>, JsonRejection>,
) -> Result<Json<Block>, ApiError> {
    let Path(id) = id?;
    let Json(req) = req?;
    let block = node.ledger.tamper(id, req.data())?;
    node.api_stats.write().await.blocks_tampered += 1;
    Ok(Json(block))
}

async fn verify_chain(State(node): State<Arc<Node>>) -> Json<VerificationReport> {
    Json(node.ledger.verify())
}

async fn get_api_stats(State(node): State<Arc<Node>>) -> impl IntoResponse {
    Json(node.get_stats().await)
}
