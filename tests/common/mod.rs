//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use executioner::adapters::gmail::{GmailMessage, MessageRef};
use executioner::adapters::drive::{DriveFile, GoogleDocument};
use executioner::adapters::{DocumentStore, MailStore, SourceAdapter};
use executioner::core::{
    Classifier, Discovery, ExecutionRequest, Pacer, SourcePlan, TaskExecutor,
};
use executioner::domain::{
    Category, DiscoveredTask, ExecutionResult, Priority, RawItem, SourceKind,
};
use executioner::error::PipelineError;
use executioner::llm::{CompletionRequest, LlmClient, LlmError, Role};

type Script = dyn Fn(&str) -> Result<String, LlmError> + Send + Sync;

/// Answers each completion from the user message it was given
pub struct ScriptedLlm {
    script: Box<Script>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(script: impl Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let user = request.message(Role::User).unwrap_or_default().to_string();
        (self.script)(&user)
    }
}

pub fn actionable(category: &str, priority: &str) -> String {
    format!(
        r#"{{"actionable": true, "category": "{}", "description": "Finish it", "priority": "{}"}}"#,
        category, priority
    )
}

pub fn not_actionable() -> String {
    r#"{"actionable": false, "category": "other", "description": "Nothing to do", "priority": "low"}"#
        .to_string()
}

pub fn requires_response(flag: bool, category: &str) -> String {
    format!(
        r#"{{"requiresResponse": {}, "category": "{}", "description": "Reply to sender", "priority": "high"}}"#,
        flag, category
    )
}

/// Adapter returning a fixed list of items, or failing
pub struct StaticSource {
    kind: SourceKind,
    items: Result<Vec<RawItem>, String>,
}

impl StaticSource {
    pub fn new(kind: SourceKind, items: Vec<RawItem>) -> Arc<dyn SourceAdapter> {
        Arc::new(Self {
            kind,
            items: Ok(items),
        })
    }

    pub fn failing(kind: SourceKind, detail: &str) -> Arc<dyn SourceAdapter> {
        Arc::new(Self {
            kind,
            items: Err(detail.to_string()),
        })
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, _query: &str, limit: usize) -> Result<Vec<RawItem>, PipelineError> {
        match &self.items {
            Ok(items) => Ok(items.iter().take(limit).cloned().collect()),
            Err(detail) => Err(PipelineError::source_unavailable(self.kind, detail.clone())),
        }
    }
}

/// Document store holding named documents with plain paragraph bodies
pub struct FakeDocuments {
    pub docs: Vec<(String, String, String)>,
}

#[async_trait]
impl DocumentStore for FakeDocuments {
    async fn search_files(&self, _query: &str, page_size: usize) -> anyhow::Result<Vec<DriveFile>> {
        Ok(self
            .docs
            .iter()
            .take(page_size)
            .map(|(id, name, _)| DriveFile {
                id: id.clone(),
                name: name.clone(),
                modified_time: Some("2024-05-01T10:00:00Z".to_string()),
                web_view_link: Some(format!("https://docs.google.com/document/d/{}", id)),
            })
            .collect())
    }

    async fn document(&self, id: &str) -> anyhow::Result<GoogleDocument> {
        let (_, _, body) = self
            .docs
            .iter()
            .find(|(doc_id, _, _)| doc_id == id)
            .ok_or_else(|| anyhow::anyhow!("document {} not found", id))?;

        Ok(serde_json::from_value(serde_json::json!({
            "body": { "content": [
                { "paragraph": { "elements": [ { "textRun": { "content": body } } ] } }
            ] }
        }))?)
    }
}

/// Mailbox holding (id, from, subject, plain body) messages
pub struct FakeMailbox {
    pub messages: Vec<(String, String, String, String)>,
}

#[async_trait]
impl MailStore for FakeMailbox {
    async fn list_messages(&self, _query: &str, max_results: usize) -> anyhow::Result<Vec<MessageRef>> {
        Ok(self
            .messages
            .iter()
            .take(max_results)
            .map(|(id, _, _, _)| MessageRef {
                id: id.clone(),
                thread_id: Some(format!("thread-{}", id)),
            })
            .collect())
    }

    async fn message(&self, id: &str) -> anyhow::Result<GmailMessage> {
        use base64::Engine;

        let (id, from, subject, body) = self
            .messages
            .iter()
            .find(|(message_id, _, _, _)| message_id == id)
            .ok_or_else(|| anyhow::anyhow!("message {} not found", id))?;

        let data = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(body);
        Ok(serde_json::from_value(serde_json::json!({
            "id": id,
            "threadId": format!("thread-{}", id),
            "snippet": body,
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [
                    { "name": "From", "value": from },
                    { "name": "Subject", "value": subject },
                    { "name": "Date", "value": "Mon, 6 May 2024 09:00:00 +0000" }
                ],
                "parts": [
                    { "mimeType": "text/plain", "body": { "data": data } }
                ]
            }
        }))?)
    }
}

pub fn discovery(llm: Arc<ScriptedLlm>, sources: Vec<Arc<dyn SourceAdapter>>) -> Discovery {
    let plans = sources
        .into_iter()
        .map(|adapter| SourcePlan::new(adapter, "", 20))
        .collect();
    Discovery::new(plans, Classifier::new(llm, Duration::from_secs(5)), Duration::from_secs(5))
}

pub fn task(id: &str) -> DiscoveredTask {
    DiscoveredTask {
        id: id.to_string(),
        source_kind: SourceKind::Drive,
        category: Category::ContentCreation,
        title: format!("Task {}", id),
        description: format!("Description of {}", id),
        priority: Priority::Medium,
        actionable: true,
        metadata: Default::default(),
    }
}

/// Executor that fails for selected task ids and records call order
#[derive(Default)]
pub struct ScriptedExecutor {
    failing: HashSet<String>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn failing(ids: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: ids.iter().map(|id| id.to_string()).collect(),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, PipelineError> {
        self.seen.lock().unwrap().push(request.task_id.clone());
        if self.failing.contains(&request.task_id) {
            return Err(PipelineError::execution_failed(
                &request.task_id,
                "model returned 500",
            ));
        }
        Ok(ExecutionResult::completed(
            &request.task_id,
            format!("Plan for {}", request.title),
        ))
    }
}

/// Executor that blocks until released, to hold a batch open
pub struct BlockingExecutor {
    pub started: Notify,
    pub release: Notify,
}

impl BlockingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Notify::new(),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl TaskExecutor for BlockingExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, PipelineError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(ExecutionResult::completed(&request.task_id, "done".to_string()))
    }
}

/// Pacer that counts pauses without waiting
#[derive(Default)]
pub struct RecordingPacer {
    pauses: AtomicUsize,
}

impl RecordingPacer {
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}

/// Adapter whose provider never answers
pub struct StalledSource {
    pub kind: SourceKind,
}

#[async_trait]
impl SourceAdapter for StalledSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, _query: &str, _limit: usize) -> Result<Vec<RawItem>, PipelineError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

/// Model that hangs on prompts containing `stall_on` and accepts the rest
pub struct StallingLlm {
    pub stall_on: &'static str,
}

#[async_trait]
impl LlmClient for StallingLlm {
    fn name(&self) -> &str {
        "stalling"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let user = request.message(Role::User).unwrap_or_default().to_string();
        if user.contains(self.stall_on) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(actionable("research", "medium"))
    }
}
