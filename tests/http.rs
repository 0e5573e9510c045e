//! HTTP Integration Tests
//!
//! Drives the router in-process; no socket is bound.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::*;
use executioner::core::{Orchestrator, TaskExecutor, Unpaced};
use executioner::domain::{RawItem, SourceKind};
use executioner::server::{router, AppState};

fn app(executor: Arc<dyn TaskExecutor>) -> Router {
    let llm = ScriptedLlm::new(|prompt| {
        if prompt.contains("WIP: Q3 report") {
            Ok(actionable("content_creation", "medium"))
        } else {
            Ok(not_actionable())
        }
    });
    let source = StaticSource::new(
        SourceKind::Drive,
        vec![
            RawItem::new("doc-q3", SourceKind::Drive, "WIP: Q3 report", "Revenue section missing"),
            RawItem::new("doc-old", SourceKind::Drive, "Draft: archived memo", ""),
        ],
    );
    let orchestrator = Orchestrator::new(discovery(llm, vec![source]), executor, Arc::new(Unpaced));
    router(Arc::new(AppState::new(orchestrator)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(ScriptedExecutor::failing(&[])), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_scan_returns_task_envelope() {
    let request = Request::builder()
        .uri("/api/task-executioner/scan")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(ScriptedExecutor::failing(&[])), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["tasksFound"], 1);
    assert_eq!(body["tasks"][0]["id"], "doc-q3");
    assert_eq!(body["tasks"][0]["sourceKind"], "drive");
    assert_eq!(body["tasks"][0]["category"], "content_creation");
    assert_eq!(body["sources"]["drive"], 1);
    assert_eq!(body["sources"]["gmail"], 0);
    assert_eq!(body["sources"]["github"], 0);
    assert_eq!(body["sources"]["notion"], 0);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_execute_returns_plan_envelope() {
    let request = post_json(
        "/api/agents/execute",
        json!({
            "taskId": "doc-q3",
            "title": "WIP: Q3 report",
            "category": "content_creation",
            "description": "Finish the revenue section"
        }),
    );
    let (status, body) = send(app(ScriptedExecutor::failing(&[])), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["taskId"], "doc-q3");
    assert_eq!(body["executionPlan"], "Plan for WIP: Q3 report");
    assert_eq!(body["status"], "completed");
    assert_eq!(body["steps"].as_array().unwrap().len(), 4);
    assert_eq!(body["steps"][0]["action"], "analysis");
}

#[tokio::test]
async fn test_execute_without_title_is_rejected() {
    let request = post_json(
        "/api/agents/execute",
        json!({ "taskId": "t1", "title": "  ", "category": "research" }),
    );
    let (status, body) = send(app(ScriptedExecutor::failing(&[])), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("title"));
}

#[tokio::test]
async fn test_execute_with_missing_fields_is_client_error() {
    let request = post_json("/api/agents/execute", json!({ "title": "No id" }));
    let (status, body) = send(app(ScriptedExecutor::failing(&[])), request).await;

    assert!(status.is_client_error());
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_execute_failure_is_server_error() {
    let request = post_json(
        "/api/agents/execute",
        json!({ "taskId": "t-bad", "title": "Broken", "category": "other" }),
    );
    let (status, body) = send(app(ScriptedExecutor::failing(&["t-bad"])), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("t-bad"));
}

#[tokio::test]
async fn test_run_reports_every_outcome() {
    let tasks: Vec<Value> = ["t1", "t2", "t3"]
        .iter()
        .map(|id| serde_json::to_value(task(id)).unwrap())
        .collect();
    let request = post_json("/api/task-executioner/run", json!({ "tasks": tasks }));
    let (status, body) = send(app(ScriptedExecutor::failing(&["t2"])), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], 2);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["outcomes"][1]["taskId"], "t2");
    assert_eq!(body["outcomes"][1]["state"], "failed");
    assert!(body["batchId"].is_string());
}

#[tokio::test]
async fn test_concurrent_run_is_conflict() {
    let executor = BlockingExecutor::new();
    let app = app(executor.clone());
    let body = json!({ "tasks": [serde_json::to_value(task("held")).unwrap()] });

    let first = tokio::spawn(send(
        app.clone(),
        post_json("/api/task-executioner/run", body.clone()),
    ));
    executor.started.notified().await;

    let (status, error) = send(app, post_json("/api/task-executioner/run", body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["success"], false);

    executor.release.notify_one();
    let (status, _) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
}
