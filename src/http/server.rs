//! HTTP API Server for Logvault
//!
//! REST endpoints for range queries over the service, host and global
//! indexes, event ingestion, and store maintenance.

use crate::{
    api::{LogQueryService, QueryError},
    core::LogEvent,
    storage::{EvictionReport, LogStore, StoreStats},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info};

/// Inclusive time range, in milliseconds since epoch.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRangeParams {
    pub start_time_millis: i64,
    pub end_time_millis: i64,
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response for batch ingestion
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub accepted: usize,
}

/// Shared application state
pub struct AppState {
    pub query_service: Arc<LogQueryService>,
    pub store: Arc<LogStore>,
}

/// Custom error type for API errors
#[derive(Debug)]
pub enum ApiError {
    Query(QueryError),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Query(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::GlobalIndexDisabled => ApiError::NotFound(err.to_string()),
            QueryError::InvalidTimeRange { .. } => ApiError::Query(err),
        }
    }
}

type LogsResponse = Result<Json<Vec<Arc<LogEvent>>>, ApiError>;

/// Create the HTTP router with all routes
pub fn create_server(store: Arc<LogStore>) -> Router {
    let state = Arc::new(AppState {
        query_service: Arc::new(LogQueryService::new(Arc::clone(&store))),
        store,
    });

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/v1/logs", post(ingest_log))
        .route("/api/v1/logs/batch", post(ingest_batch))
        .route("/api/v1/logs/service/:service_name", get(logs_by_service))
        .route("/api/v1/logs/service/:service_name/host/:host_id", get(logs_by_service_and_host))
        .route("/api/v1/logs/host/:host_id", get(logs_by_host))
        .route("/api/v1/logs/global", get(global_logs))
        .route("/api/v1/admin/eviction", post(run_eviction))
        .route("/api/v1/admin/stats", get(store_stats))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(SuccessResponse { message: "Logvault HTTP API is running".to_string() })
}

/// GET /api/v1/logs/service/:service_name
async fn logs_by_service(
    State(state): State<Arc<AppState>>,
    Path(service_name): Path<String>,
    Query(range): Query<TimeRangeParams>,
) -> LogsResponse {
    let logs = state.query_service.logs_by_service(
        &service_name,
        range.start_time_millis,
        range.end_time_millis,
    )?;
    Ok(Json(logs))
}

/// GET /api/v1/logs/host/:host_id
async fn logs_by_host(
    State(state): State<Arc<AppState>>,
    Path(host_id): Path<String>,
    Query(range): Query<TimeRangeParams>,
) -> LogsResponse {
    let logs =
        state.query_service.logs_by_host(&host_id, range.start_time_millis, range.end_time_millis)?;
    Ok(Json(logs))
}

/// GET /api/v1/logs/service/:service_name/host/:host_id
async fn logs_by_service_and_host(
    State(state): State<Arc<AppState>>,
    Path((service_name, host_id)): Path<(String, String)>,
    Query(range): Query<TimeRangeParams>,
) -> LogsResponse {
    let logs = state.query_service.logs_by_service_and_host(
        &service_name,
        &host_id,
        range.start_time_millis,
        range.end_time_millis,
    )?;
    Ok(Json(logs))
}

/// GET /api/v1/logs/global
async fn global_logs(
    State(state): State<Arc<AppState>>,
    Query(range): Query<TimeRangeParams>,
) -> LogsResponse {
    let logs = state.query_service.global_logs(range.start_time_millis, range.end_time_millis)?;
    Ok(Json(logs))
}

/// Runs store work that may sweep every partition off the async workers.
async fn blocking<T, F>(state: &Arc<AppState>, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&LogStore) -> T + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || work(&store)).await.map_err(|e| {
        error!("Store task failed: {}", e);
        ApiError::Internal("Internal store error".to_string())
    })
}

/// POST /api/v1/logs - Ingest one event. A `null` body is accepted and ignored.
async fn ingest_log(
    State(state): State<Arc<AppState>>,
    Json(event): Json<Option<LogEvent>>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let accepted = usize::from(event.is_some());
    blocking(&state, move |store| store.insert_optional(event)).await?;
    Ok((StatusCode::ACCEPTED, Json(IngestResponse { accepted })))
}

/// POST /api/v1/logs/batch - Ingest an array of events
async fn ingest_batch(
    State(state): State<Arc<AppState>>,
    Json(events): Json<Vec<LogEvent>>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let accepted = events.len();
    blocking(&state, move |store| {
        for event in events {
            store.insert(event);
        }
    })
    .await?;
    debug!(accepted, "Ingested log batch");
    Ok((StatusCode::ACCEPTED, Json(IngestResponse { accepted })))
}

/// POST /api/v1/admin/eviction - Run one retention sweep now
async fn run_eviction(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EvictionReport>, ApiError> {
    blocking(&state, LogStore::run_eviction)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::Conflict("An eviction sweep is already running".to_string()))
}

/// GET /api/v1/admin/stats - Store statistics
async fn store_stats(State(state): State<Arc<AppState>>) -> Json<StoreStats> {
    Json(state.store.stats())
}

/// Start the HTTP server on the specified address
pub async fn start_server(addr: &str, store: Arc<LogStore>) -> crate::Result<()> {
    let app = create_server(store);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Logvault HTTP API server listening on http://{}", addr);
    info!("  POST /api/v1/logs                                   - Ingest one event");
    info!("  POST /api/v1/logs/batch                             - Ingest a batch of events");
    info!("  GET  /api/v1/logs/service/:service_name             - Logs by service");
    info!("  GET  /api/v1/logs/host/:host_id                     - Logs by host");
    info!("  GET  /api/v1/logs/service/:service_name/host/:host_id - Logs by service and host");
    info!("  GET  /api/v1/logs/global                            - Logs across all services");
    info!("  POST /api/v1/admin/eviction                         - Run a retention sweep");
    info!("  GET  /api/v1/admin/stats                            - Store statistics");
    info!("  GET  /health                                        - Health check");

    axum::serve(listener, app).await?;

    Ok(())
}
