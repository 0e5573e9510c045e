//! Source adapters for external systems.
//!
//! Each adapter fetches candidate items from one provider and normalizes
//! them into `RawItem`s. Adapters never fail a discovery pass: `scan`
//! swallows provider errors and contributes nothing instead.

pub mod drive;
pub mod github;
pub mod gmail;
pub mod google;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::{RawItem, SourceKind};
use crate::error::PipelineError;

pub use drive::{DocumentStore, DriveAdapter};
pub use github::GithubAdapter;
pub use gmail::{GmailAdapter, MailStore};
pub use google::{GoogleAuth, GoogleCredentials, GoogleWorkspace};

/// Trait for discovery sources
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Which member of the source union this adapter serves
    fn kind(&self) -> SourceKind;

    /// Fetch and normalize up to `limit` items matching a provider-native
    /// `query`. The query is passed to the provider unmodified.
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<RawItem>, PipelineError>;

    /// Like `fetch`, but a provider failure yields an empty sequence
    async fn scan(&self, query: &str, limit: usize) -> Vec<RawItem> {
        match self.fetch(query, limit).await {
            Ok(items) => items,
            Err(e) => {
                warn!(source = %self.kind(), error = %e, "Source scan failed, contributing no items");
                Vec::new()
            }
        }
    }
}

/// Cut `text` to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
