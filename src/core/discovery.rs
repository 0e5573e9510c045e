//! Discovery orchestrator.
//!
//! Fans a scan out across all configured sources, classifies every returned
//! item and keeps the actionable ones. Sources run concurrently; items of
//! one source are classified one at a time.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::classifier::{Classifier, PromptContext, DEFAULT_EXCERPT_CHARS};
use crate::adapters::SourceAdapter;
use crate::domain::{DiscoveredTask, SourceKind};

/// One configured source: an adapter plus what to ask it for
#[derive(Clone)]
pub struct SourcePlan {
    pub adapter: Arc<dyn SourceAdapter>,

    /// Provider-native filter, passed through unmodified
    pub query: String,

    pub limit: usize,
}

impl SourcePlan {
    pub fn new(adapter: Arc<dyn SourceAdapter>, query: impl Into<String>, limit: usize) -> Self {
        Self {
            adapter,
            query: query.into(),
            limit,
        }
    }
}

/// Result of one discovery pass
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReport {
    /// Source invocation order, then provider order within a source
    pub tasks: Vec<DiscoveredTask>,

    /// Accepted tasks per source kind; every kind is present
    pub sources: BTreeMap<SourceKind, usize>,

    pub scanned_at: DateTime<Utc>,
}

impl DiscoveryReport {
    pub fn tasks_found(&self) -> usize {
        self.tasks.len()
    }
}

/// Runs discovery passes over a fixed set of sources
pub struct Discovery {
    sources: Vec<SourcePlan>,
    classifier: Classifier,
    scan_timeout: Duration,
    excerpt_chars: usize,
}

impl Discovery {
    pub fn new(sources: Vec<SourcePlan>, classifier: Classifier, scan_timeout: Duration) -> Self {
        Self {
            sources,
            classifier,
            scan_timeout,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }

    pub fn with_excerpt_chars(mut self, excerpt_chars: usize) -> Self {
        self.excerpt_chars = excerpt_chars;
        self
    }

    /// Run one discovery pass across every source
    #[instrument(skip(self), fields(sources = self.sources.len()))]
    pub async fn discover(&self) -> DiscoveryReport {
        info!("Starting discovery pass");

        let passes = self.sources.iter().map(|source| self.discover_source(source));
        let per_source = join_all(passes).await;

        let mut sources: BTreeMap<SourceKind, usize> =
            SourceKind::ALL.iter().map(|kind| (*kind, 0)).collect();
        let mut seen = HashSet::new();
        let mut tasks = Vec::new();

        for (kind, found) in per_source {
            for task in found {
                // Provider ids are unique per provider; a repeat within one
                // pass is the same record returned twice.
                if !seen.insert(task.id.clone()) {
                    warn!(source = %kind, task_id = %task.id, "Dropping repeated id within one pass");
                    continue;
                }
                *sources.entry(kind).or_insert(0) += 1;
                tasks.push(task);
            }
        }

        info!(tasks_found = tasks.len(), "Discovery pass complete");

        DiscoveryReport {
            tasks,
            sources,
            scanned_at: Utc::now(),
        }
    }

    async fn discover_source(&self, source: &SourcePlan) -> (SourceKind, Vec<DiscoveredTask>) {
        let kind = source.adapter.kind();

        let scan = source.adapter.scan(&source.query, source.limit);
        let items = match tokio::time::timeout(self.scan_timeout, scan).await {
            Ok(items) => items,
            Err(_) => {
                warn!(source = %kind, timeout = ?self.scan_timeout, "Source scan timed out, contributing no items");
                Vec::new()
            }
        };

        debug!(source = %kind, items = items.len(), "Classifying scanned items");

        let mut tasks = Vec::new();
        for item in items {
            let context = PromptContext::from_item(&item, self.excerpt_chars);
            let verdict = self.classifier.classify(&context).await;
            match verdict {
                Ok(verdict) => {
                    if let Some(task) = DiscoveredTask::from_verdict(item, verdict) {
                        tasks.push(task);
                    }
                }
                Err(e) => {
                    warn!(source = %kind, item_id = %item.id, error = %e, "Classification failed, treating item as not actionable");
                }
            }
        }

        (kind, tasks)
    }
}
