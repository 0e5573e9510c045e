//! Command-line interface for the executioner.
//!
//! Provides commands for serving the HTTP surface, running a discovery
//! scan, executing a single task and running a full scan-then-execute
//! batch.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{self, ResolvedConfig};
use crate::core::{ExecutionRequest, Orchestrator};
use crate::domain::ExecutionResult;
use crate::server::{self, AppState};

/// executioner - discover unfinished work and execute it with an LLM agent
#[derive(Parser, Debug)]
#[command(name = "executioner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to (defaults to configured host:port)
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Scan all configured sources and print discovered tasks
    Scan,

    /// Execute a single task and print the plan
    Execute {
        /// Task title
        title: String,

        /// Task category (e.g. content_creation, research)
        #[arg(short, long, default_value = "other")]
        category: String,

        /// Optional task description
        #[arg(short, long)]
        description: Option<String>,

        /// Task ID (generated if not provided)
        #[arg(long)]
        task_id: Option<String>,
    },

    /// Scan, then execute every discovered task one at a time
    Run {
        /// Only execute the first N discovered tasks
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show resolved configuration (secrets redacted)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        // Credentials are read once, here, before any command runs
        let config = config::config().context("Failed to load configuration")?;

        match self.command {
            Commands::Serve { address } => serve(config, address).await,
            Commands::Scan => scan(config).await,
            Commands::Execute {
                title,
                category,
                description,
                task_id,
            } => execute_one(config, title, category, description, task_id).await,
            Commands::Run { limit } => run_batch(config, limit).await,
            Commands::Config => show_config(config),
        }
    }
}

async fn serve(config: &ResolvedConfig, address: Option<String>) -> Result<()> {
    let address = address.unwrap_or_else(|| config.server.address());
    let state = Arc::new(AppState::new(Orchestrator::from_config(config)));
    server::serve(state, &address).await
}

async fn scan(config: &ResolvedConfig) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config);
    let report = orchestrator.scan().await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn execute_one(
    config: &ResolvedConfig,
    title: String,
    category: String,
    description: Option<String>,
    task_id: Option<String>,
) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config);
    let request = ExecutionRequest {
        task_id: task_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        title,
        category,
        description,
    };

    let result = orchestrator.execute(&request).await?;

    println!("Task:   {}", request.title);
    println!("ID:     {}", result.task_id);
    println!("Status: {:?}", result.state);
    println!();
    for step in &result.steps {
        println!("  {}. {} [{:?}]", step.index, step.action, step.state);
    }
    println!();
    println!("{}", result.plan);

    Ok(())
}

async fn run_batch(config: &ResolvedConfig, limit: Option<usize>) -> Result<()> {
    let (results_tx, mut results_rx) = mpsc::unbounded_channel::<ExecutionResult>();
    let orchestrator = Orchestrator::from_config(config).with_result_sink(results_tx);

    // Plans are printed as each task finishes
    let printer = tokio::spawn(async move {
        while let Some(result) = results_rx.recv().await {
            println!("── {} ──", result.task_id);
            println!("{}", result.plan);
            println!();
        }
    });

    let report = orchestrator.scan().await;
    let mut tasks = report.tasks;
    if let Some(limit) = limit {
        tasks.truncate(limit);
    }

    if tasks.is_empty() {
        println!("No actionable tasks found.");
        return Ok(());
    }

    info!(count = tasks.len(), "Executing discovered tasks");

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current task");
                cancel.cancel();
            }
        })
    };

    let batch = orchestrator.run_all(tasks, &cancel).await;
    watcher.abort();

    // Dropping the orchestrator closes the sink so the printer drains and exits
    drop(orchestrator);
    let _ = printer.await;
    let batch = batch?;

    println!("Batch {}", batch.batch_id);
    for outcome in &batch.outcomes {
        match &outcome.error {
            Some(error) => println!("  ✗ {} ({}): {}", outcome.title, outcome.task_id, error),
            None => println!("  ✓ {} ({})", outcome.title, outcome.task_id),
        }
    }
    println!(
        "{} completed, {} failed",
        batch.completed(),
        batch.failed()
    );

    Ok(())
}

fn show_config(config: &ResolvedConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}
