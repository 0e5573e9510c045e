//! Error taxonomy for the discovery and execution pipeline.
//!
//! Source and classifier failures are contained at their own layer and
//! degrade to "no data". Execution failures are recorded per task.
//! Missing configuration is fatal at start-up.

use thiserror::Error;

use crate::domain::SourceKind;
use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A provider could not be reached or rejected the request
    #[error("Source '{kind}' unavailable: {detail}")]
    SourceUnavailable { kind: SourceKind, detail: String },

    /// The model response did not match the verdict contract
    #[error("Malformed verdict: {0}")]
    MalformedVerdict(String),

    #[error("Task '{task_id}' execution failed: {detail}")]
    TaskExecutionFailed { task_id: String, detail: String },

    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("A batch run is already in progress")]
    BatchAlreadyRunning,

    #[error(transparent)]
    Model(#[from] LlmError),
}

impl PipelineError {
    pub fn source_unavailable(kind: SourceKind, detail: impl ToString) -> Self {
        Self::SourceUnavailable {
            kind,
            detail: detail.to_string(),
        }
    }

    pub fn execution_failed(task_id: impl Into<String>, detail: impl ToString) -> Self {
        Self::TaskExecutionFailed {
            task_id: task_id.into(),
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = PipelineError::source_unavailable(SourceKind::Gmail, "401 Unauthorized");
        assert_eq!(err.to_string(), "Source 'gmail' unavailable: 401 Unauthorized");

        let err = PipelineError::execution_failed("t-9", "timed out after 120s");
        assert_eq!(
            err.to_string(),
            "Task 't-9' execution failed: timed out after 120s"
        );
    }
}
