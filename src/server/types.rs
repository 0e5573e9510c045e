//! Request and response bodies for the HTTP surface.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::core::{BatchReport, DiscoveryReport, ExecutionRequest};
use crate::domain::{
    DiscoveredTask, ExecutionResult, ExecutionState, ExecutionStep, SourceKind, TaskOutcome,
};
use crate::error::PipelineError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub success: bool,
    pub task_id: String,
    pub title: String,
    pub category: String,
    pub execution_plan: String,
    pub steps: Vec<ExecutionStep>,
    pub status: ExecutionState,
    pub timestamp: DateTime<Utc>,
}

impl ExecuteResponse {
    pub fn new(request: ExecutionRequest, result: ExecutionResult) -> Self {
        Self {
            success: true,
            task_id: result.task_id,
            title: request.title,
            category: request.category,
            execution_plan: result.plan,
            steps: result.steps,
            status: result.state,
            timestamp: result.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub success: bool,
    pub tasks_found: usize,
    pub tasks: Vec<DiscoveredTask>,
    pub sources: BTreeMap<SourceKind, usize>,
    pub timestamp: DateTime<Utc>,
}

impl From<DiscoveryReport> for ScanResponse {
    fn from(report: DiscoveryReport) -> Self {
        Self {
            success: true,
            tasks_found: report.tasks_found(),
            tasks: report.tasks,
            sources: report.sources,
            timestamp: report.scanned_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub tasks: Vec<DiscoveredTask>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub success: bool,
    pub batch_id: Uuid,
    pub completed: usize,
    pub failed: usize,
    pub outcomes: Vec<TaskOutcome>,
    pub timestamp: DateTime<Utc>,
}

impl From<BatchReport> for RunResponse {
    fn from(report: BatchReport) -> Self {
        Self {
            success: true,
            batch_id: report.batch_id,
            completed: report.completed(),
            failed: report.failed(),
            outcomes: report.outcomes,
            timestamp: report.finished_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    timestamp: DateTime<Utc>,
}

/// Failure envelope with its HTTP status
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = match err {
            PipelineError::BatchAlreadyRunning => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "Request failed");
        }

        let body = ErrorBody {
            success: false,
            error: self.message,
            timestamp: Utc::now(),
        };
        (self.status, Json(body)).into_response()
    }
}
