//! Execution results and per-task batch outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical phases recorded for every executed task
pub const CANONICAL_PHASES: [&str; 4] = [
    "analysis",
    "resource gathering",
    "strategy development",
    "implementation",
];

/// State of a single step in an execution trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Completed,
    Failed,
}

/// One step of an execution trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStep {
    /// 1-based, increasing within one result
    pub index: u32,

    pub action: String,

    pub state: StepState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_note: Option<String>,
}

/// Terminal state of one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Completed,
    Failed,
}

/// The output of one execution agent invocation.
///
/// Never patched after creation. A retry produces a new result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub task_id: String,

    /// Raw plan text from the model
    pub plan: String,

    pub steps: Vec<ExecutionStep>,

    pub state: ExecutionState,

    pub completed_at: DateTime<Utc>,
}

impl ExecutionResult {
    /// A completed result carrying the canonical four-phase trace
    pub fn completed(task_id: impl Into<String>, plan: String) -> Self {
        let steps = CANONICAL_PHASES
            .iter()
            .zip(1u32..)
            .map(|(action, index)| ExecutionStep {
                index,
                action: action.to_string(),
                state: StepState::Completed,
                result_note: None,
            })
            .collect();

        Self {
            task_id: task_id.into(),
            plan,
            steps,
            state: ExecutionState::Completed,
            completed_at: Utc::now(),
        }
    }
}

/// Run state of one task inside a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRunState {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskRunState {
    /// Completed and failed are terminal within a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskRunState::Completed | TaskRunState::Failed)
    }
}

/// What happened to one task in a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutcome {
    pub task_id: String,

    pub title: String,

    /// Always terminal
    pub state: TaskRunState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub finished_at: DateTime<Utc>,
}

impl TaskOutcome {
    pub fn completed(task_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            title: title.into(),
            state: TaskRunState::Completed,
            error: None,
            finished_at: Utc::now(),
        }
    }

    pub fn failed(task_id: impl Into<String>, title: impl Into<String>, error: String) -> Self {
        Self {
            task_id: task_id.into(),
            title: title.into(),
            state: TaskRunState::Failed,
            error: Some(error),
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_result_has_canonical_trace() {
        let result = ExecutionResult::completed("t-1", "plan".to_string());

        assert_eq!(result.state, ExecutionState::Completed);
        assert_eq!(result.steps.len(), 4);
        let indices: Vec<u32> = result.steps.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        assert_eq!(result.steps[1].action, "resource gathering");
        assert!(result.steps.iter().all(|s| s.state == StepState::Completed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskRunState::Completed.is_terminal());
        assert!(TaskRunState::Failed.is_terminal());
        assert!(!TaskRunState::Pending.is_terminal());
        assert!(!TaskRunState::InProgress.is_terminal());
    }
}
