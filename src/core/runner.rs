//! Execution orchestrator.
//!
//! Runs tasks strictly one at a time in input order, pausing between
//! consecutive tasks. A failing task is recorded and the batch moves on;
//! every input task ends with exactly one terminal outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::agent::{ExecutionRequest, TaskExecutor};
use super::pacer::Pacer;
use crate::domain::{DiscoveredTask, ExecutionResult, TaskOutcome, TaskRunState};
use crate::error::PipelineError;

pub const CANCELLED_DETAIL: &str = "batch cancelled before task started";

/// Outcomes of one batch run, in input order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub outcomes: Vec<TaskOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.count(TaskRunState::Completed)
    }

    pub fn failed(&self) -> usize {
        self.count(TaskRunState::Failed)
    }

    fn count(&self, state: TaskRunState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }
}

/// Clears the running flag when a batch ends, however it ends
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sequential batch runner
pub struct BatchRunner {
    executor: Arc<dyn TaskExecutor>,
    pacer: Arc<dyn Pacer>,
    results: Option<mpsc::UnboundedSender<ExecutionResult>>,
    running: AtomicBool,
}

impl BatchRunner {
    pub fn new(executor: Arc<dyn TaskExecutor>, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            executor,
            pacer,
            results: None,
            running: AtomicBool::new(false),
        }
    }

    /// Hand every produced `ExecutionResult` to `sink` as soon as it exists
    pub fn with_result_sink(mut self, sink: mpsc::UnboundedSender<ExecutionResult>) -> Self {
        self.results = Some(sink);
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run every task in order.
    ///
    /// `cancel` is checked between tasks, never mid-task. Tasks not yet
    /// started when it fires are recorded as failed.
    #[instrument(skip(self, tasks, cancel), fields(tasks = tasks.len()))]
    pub async fn run_all(
        &self,
        tasks: Vec<DiscoveredTask>,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, PipelineError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(PipelineError::BatchAlreadyRunning);
        }
        let _guard = RunningGuard(&self.running);

        let batch_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = tasks.len();
        info!(%batch_id, total, "Starting batch run");

        let mut states = vec![TaskRunState::Pending; total];
        let mut outcomes = Vec::with_capacity(total);

        for (position, task) in tasks.iter().enumerate() {
            if position > 0 {
                // A cancellation during the pause ends it early
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    _ = self.pacer.pause() => {}
                }
            }

            if cancel.is_cancelled() {
                warn!(%batch_id, remaining = total - position, "Batch cancelled");
                for skipped in &tasks[position..] {
                    outcomes.push(TaskOutcome::failed(
                        &skipped.id,
                        &skipped.title,
                        CANCELLED_DETAIL.to_string(),
                    ));
                }
                states[position..].fill(TaskRunState::Failed);
                break;
            }

            states[position] = TaskRunState::InProgress;
            debug!(task_id = %task.id, position = position + 1, total, "Task in progress");

            let outcome = self.run_one(task).await;
            states[position] = outcome.state;
            outcomes.push(outcome);
        }

        debug_assert!(states.iter().all(TaskRunState::is_terminal));

        let report = BatchReport {
            batch_id,
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            %batch_id,
            completed = report.completed(),
            failed = report.failed(),
            "Batch run finished"
        );

        Ok(report)
    }

    async fn run_one(&self, task: &DiscoveredTask) -> TaskOutcome {
        let request = ExecutionRequest::from(task);

        match self.executor.execute(&request).await {
            Ok(result) => {
                if let Some(sink) = &self.results {
                    // A dropped receiver only means nobody wants results
                    let _ = sink.send(result);
                }
                info!(task_id = %task.id, "Task completed");
                TaskOutcome::completed(&task.id, &task.title)
            }
            Err(e) => {
                error!(task_id = %task.id, error = %e, "Task failed");
                TaskOutcome::failed(&task.id, &task.title, e.to_string())
            }
        }
    }
}
