//! HTTP surface.
//!
//! Every response is a JSON envelope with `success` and `timestamp`;
//! failures carry an `error` message and an HTTP error status.

mod types;

pub use types::{ApiError, ExecuteResponse, RunRequest, RunResponse, ScanResponse};

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::core::{ExecutionRequest, Orchestrator};

/// Shared application state
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Fired on shutdown; running batches stop between tasks
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            shutdown: CancellationToken::new(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/agents/execute", post(execute_task))
        .route("/api/task-executioner/scan", get(scan_sources))
        .route("/api/task-executioner/run", post(run_tasks))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server
pub async fn serve(state: Arc<AppState>, address: &str) -> anyhow::Result<()> {
    let app = router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(address).await?;

    info!("Server listening on {}", address);

    let shutdown = state.shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn execute_task(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExecutionRequest>, JsonRejection>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let Json(request) = payload.map_err(ApiError::from)?;

    if request.task_id.trim().is_empty() || request.title.trim().is_empty() {
        return Err(ApiError::bad_request("taskId and title are required"));
    }

    info!(task_id = %request.task_id, "Executing task");
    let result = state.orchestrator.execute(&request).await?;

    Ok(Json(ExecuteResponse::new(request, result)))
}

async fn scan_sources(State(state): State<Arc<AppState>>) -> Json<ScanResponse> {
    info!("Starting task scan");
    let report = state.orchestrator.scan().await;
    Json(ScanResponse::from(report))
}

async fn run_tasks(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<RunResponse>, ApiError> {
    let Json(request) = payload.map_err(ApiError::from)?;

    let report = state
        .orchestrator
        .run_all(request.tasks, &state.shutdown)
        .await?;

    Ok(Json(RunResponse::from(report)))
}
