//! Main orchestrator wiring discovery and execution together.
//!
//! Builds the configured sources, classifier, execution agent and batch
//! runner, and exposes the three operations the CLI and HTTP surface use:
//! scan, execute one task, run a batch.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::agent::{ExecutionAgent, ExecutionRequest, TaskExecutor};
use super::classifier::Classifier;
use super::discovery::{Discovery, DiscoveryReport, SourcePlan};
use super::pacer::{FixedInterval, Pacer};
use super::runner::{BatchReport, BatchRunner};
use crate::adapters::{
    DriveAdapter, GithubAdapter, GmailAdapter, GoogleAuth, GoogleWorkspace, SourceAdapter,
};
use crate::config::ResolvedConfig;
use crate::domain::{DiscoveredTask, ExecutionResult};
use crate::error::PipelineError;
use crate::llm::{LlmClient, OpenAiClient};

/// Top-level pipeline
pub struct Orchestrator {
    discovery: Discovery,
    executor: Arc<dyn TaskExecutor>,
    runner: BatchRunner,
}

impl Orchestrator {
    /// Assemble from explicit parts
    pub fn new(discovery: Discovery, executor: Arc<dyn TaskExecutor>, pacer: Arc<dyn Pacer>) -> Self {
        let runner = BatchRunner::new(Arc::clone(&executor), pacer);
        Self {
            discovery,
            executor,
            runner,
        }
    }

    /// Assemble the production pipeline from resolved configuration
    pub fn from_config(config: &ResolvedConfig) -> Self {
        let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::with_base_url(
            config.openai.api_key.clone(),
            config.openai.model.clone(),
            config.openai.base_url.clone(),
        ));

        let sources = Self::build_sources(config);
        if sources.is_empty() {
            warn!("No discovery sources configured; scans will find nothing");
        }

        let classifier = Classifier::new(Arc::clone(&llm), config.classifier.timeout);
        let discovery = Discovery::new(sources, classifier, config.sources.scan_timeout)
            .with_excerpt_chars(config.classifier.excerpt_chars);

        let agent = Arc::new(ExecutionAgent::new(llm, config.execution.agent));
        let pacer = Arc::new(FixedInterval::new(config.execution.delay));

        Self::new(discovery, agent, pacer)
    }

    fn build_sources(config: &ResolvedConfig) -> Vec<SourcePlan> {
        let mut sources = Vec::new();
        let plan = &config.sources;

        match &config.google {
            Some(credentials) => {
                let auth = Arc::new(GoogleAuth::new(credentials.clone()));
                let workspace = Arc::new(GoogleWorkspace::new(auth));

                if plan.drive.enabled {
                    let adapter: Arc<dyn SourceAdapter> = Arc::new(DriveAdapter::new(workspace.clone()));
                    sources.push(SourcePlan::new(adapter, &plan.drive.query, plan.drive.limit));
                }
                if plan.gmail.enabled {
                    let adapter: Arc<dyn SourceAdapter> = Arc::new(GmailAdapter::new(workspace));
                    sources.push(SourcePlan::new(adapter, &plan.gmail.query, plan.gmail.limit));
                }
            }
            None => warn!("Google credentials not set; drive and gmail sources disabled"),
        }

        match &config.github_token {
            Some(token) if plan.github.enabled => {
                let adapter: Arc<dyn SourceAdapter> = Arc::new(GithubAdapter::new(token.clone()));
                sources.push(SourcePlan::new(adapter, &plan.github.query, plan.github.limit));
            }
            Some(_) => {}
            None => warn!("GITHUB_TOKEN not set; github source disabled"),
        }

        info!(count = sources.len(), "Discovery sources configured");
        sources
    }

    /// Hand every produced `ExecutionResult` to `sink`
    pub fn with_result_sink(mut self, sink: mpsc::UnboundedSender<ExecutionResult>) -> Self {
        self.runner = self.runner.with_result_sink(sink);
        self
    }

    /// One discovery pass across all sources
    pub async fn scan(&self) -> DiscoveryReport {
        self.discovery.discover().await
    }

    /// Execute a single task outside any batch
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, PipelineError> {
        self.executor.execute(request).await
    }

    /// Run a batch of tasks sequentially
    pub async fn run_all(
        &self,
        tasks: Vec<DiscoveredTask>,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, PipelineError> {
        self.runner.run_all(tasks, cancel).await
    }

    pub fn is_batch_running(&self) -> bool {
        self.runner.is_running()
    }
}
