//! executioner - discover unfinished work and execute it with an LLM agent
//!
//! Scans document stores, inboxes and issue trackers for unfinished work,
//! asks a language model which items are actionable, and executes the
//! accepted tasks one at a time.
//!
//! # Architecture
//!
//! The pipeline runs leaf-first:
//! - Source adapters normalize provider records into `RawItem`s
//! - The classifier judges each item under a strict JSON contract
//! - Discovery fans out across sources and keeps actionable items
//! - The execution agent turns one task into a plan
//! - The batch runner executes tasks sequentially, paced, and never stops
//!   on a single failure
//!
//! # Modules
//!
//! - `adapters`: Provider integrations (Drive, Gmail, GitHub)
//! - `llm`: Language model provider seam
//! - `core`: Classifier, Discovery, Agent, Runner, Orchestrator
//! - `domain`: Data structures (RawItem, DiscoveredTask, ExecutionResult)
//! - `server`: HTTP surface
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Scan all configured sources
//! executioner scan
//!
//! # Scan, then execute everything found
//! executioner run
//!
//! # Serve the HTTP API
//! executioner serve
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod llm;
pub mod server;

// Re-export main types at crate root for convenience
pub use core::{BatchRunner, Discovery, ExecutionAgent, Orchestrator};
pub use domain::{DiscoveredTask, ExecutionResult, RawItem, SourceKind, TaskOutcome};
pub use error::PipelineError;
