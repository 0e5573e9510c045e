//! Core pipeline logic.
//!
//! This module contains:
//! - Classifier: LLM actionability judgment with a strict response contract
//! - Discovery: multi-source scan, classify and aggregate
//! - Agent: per-task execution plan generation
//! - Runner: sequential, paced, failure-isolated batch execution
//! - Orchestrator: wires the above from configuration

pub mod agent;
pub mod classifier;
pub mod discovery;
pub mod orchestrator;
pub mod pacer;
pub mod runner;

// Re-export commonly used types
pub use agent::{AgentSettings, ExecutionAgent, ExecutionRequest, TaskExecutor};
pub use classifier::{Classifier, PromptContext, VerdictContract, DEFAULT_EXCERPT_CHARS};
pub use discovery::{Discovery, DiscoveryReport, SourcePlan};
pub use orchestrator::Orchestrator;
pub use pacer::{FixedInterval, Pacer, Unpaced};
pub use runner::{BatchReport, BatchRunner, CANCELLED_DETAIL};
