//! Execution agent: turns one task into an execution plan.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::domain::{DiscoveredTask, ExecutionResult};
use crate::error::PipelineError;
use crate::llm::{ChatMessage, CompletionRequest, LlmClient, LlmError};

/// What the agent needs to know about a task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub task_id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<&DiscoveredTask> for ExecutionRequest {
    fn from(task: &DiscoveredTask) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            category: task.category.to_string(),
            description: Some(task.description.clone()).filter(|d| !d.is_empty()),
        }
    }
}

/// Anything that can execute one task
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, PipelineError>;
}

/// Sampling and bounding parameters for plan generation
#[derive(Debug, Clone, Copy)]
pub struct AgentSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1500,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Produces an execution plan with one completion per task.
///
/// Does not retry; a failure surfaces as `TaskExecutionFailed`.
pub struct ExecutionAgent {
    llm: Arc<dyn LlmClient>,
    settings: AgentSettings,
}

impl ExecutionAgent {
    pub fn new(llm: Arc<dyn LlmClient>, settings: AgentSettings) -> Self {
        Self { llm, settings }
    }

    pub fn system_prompt(category: &str) -> String {
        format!(
            "You are an autonomous AI agent that executes {category} tasks.\n\
             For the task you are given, provide:\n\
             1. A breakdown of the task into clear steps\n\
             2. The specific actions to take for each step\n\
             3. The expected outcomes\n\
             4. The concrete deliverables\n\
             5. Recommended next steps",
            category = category
        )
    }

    pub fn user_prompt(request: &ExecutionRequest) -> String {
        let mut prompt = format!(
            "Execute the following task:\n\nTitle: {}\nCategory: {}\n",
            request.title, request.category
        );
        if let Some(description) = &request.description {
            prompt.push_str(&format!("Description: {}\n", description));
        }
        prompt.push_str("\nProvide a detailed execution plan and results.");
        prompt
    }

    fn build_request(&self, request: &ExecutionRequest) -> CompletionRequest {
        CompletionRequest::new(vec![
            ChatMessage::system(Self::system_prompt(&request.category)),
            ChatMessage::user(Self::user_prompt(request)),
        ])
        .with_temperature(self.settings.temperature)
        .with_max_tokens(self.settings.max_tokens)
    }
}

#[async_trait]
impl TaskExecutor for ExecutionAgent {
    #[instrument(skip(self, request), fields(provider = self.llm.name(), task_id = %request.task_id))]
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, PipelineError> {
        let completion = self.llm.complete(self.build_request(request));

        let plan = tokio::time::timeout(self.settings.timeout, completion)
            .await
            .map_err(|_| LlmError::Timeout(self.settings.timeout))
            .and_then(|r| r)
            .map_err(|e| PipelineError::execution_failed(&request.task_id, e))?;

        info!(plan_chars = plan.len(), "Execution plan generated");
        Ok(ExecutionResult::completed(&request.task_id, plan))
    }
}
