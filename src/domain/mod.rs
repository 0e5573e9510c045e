//! Domain types for the task executioner.
//!
//! This module contains the core data structures:
//! - Task: raw items from providers and the tasks discovered in them
//! - Verdict: the classifier's judgment of one item
//! - Execution: execution results and batch outcomes

pub mod execution;
pub mod task;
pub mod verdict;

// Re-export commonly used types
pub use execution::{
    ExecutionResult, ExecutionState, ExecutionStep, StepState, TaskOutcome, TaskRunState,
    CANONICAL_PHASES,
};
pub use task::{Category, DiscoveredTask, Metadata, Priority, RawItem, SourceKind};
pub use verdict::ClassificationVerdict;
