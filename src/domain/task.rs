//! Raw items and discovered tasks.
//!
//! A `RawItem` is what a source adapter hands to the classifier. A
//! `DiscoveredTask` is what survives classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::verdict::ClassificationVerdict;

/// Free-form provenance captured from the provider
pub type Metadata = Map<String, Value>;

/// The closed set of systems work can be discovered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Google Drive documents
    Drive,

    /// Gmail inbox
    Gmail,

    /// GitHub issues
    Github,

    /// Notion pages
    Notion,
}

impl SourceKind {
    /// Every kind, in reporting order
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Drive,
        SourceKind::Gmail,
        SourceKind::Github,
        SourceKind::Notion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Drive => "drive",
            SourceKind::Gmail => "gmail",
            SourceKind::Github => "github",
            SourceKind::Notion => "notion",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate record fetched from a provider, normalized to plain text
#[derive(Debug, Clone)]
pub struct RawItem {
    /// Provider-native identifier
    pub id: String,

    /// Which adapter produced this item
    pub source_kind: SourceKind,

    /// Document name, mail subject or issue title
    pub title: String,

    /// Sender or owner, when the provider has one
    pub author: Option<String>,

    /// Plain-text body extracted from the provider payload
    pub body_excerpt: String,

    /// Provenance kept on the resulting task
    pub captured_metadata: Metadata,
}

impl RawItem {
    pub fn new(
        id: impl Into<String>,
        source_kind: SourceKind,
        title: impl Into<String>,
        body_excerpt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_kind,
            title: title.into(),
            author: None,
            body_excerpt: body_excerpt.into(),
            captured_metadata: Metadata::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.captured_metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Kind of work the classifier judged an item to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ContentCreation,
    Research,
    ClientWork,
    Automation,
    CustomerInquiry,
    ClientRequest,
    Collaboration,
    Spam,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ContentCreation => "content_creation",
            Category::Research => "research",
            Category::ClientWork => "client_work",
            Category::Automation => "automation",
            Category::CustomerInquiry => "customer_inquiry",
            Category::ClientRequest => "client_request",
            Category::Collaboration => "collaboration",
            Category::Spam => "spam",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An item the classifier accepted as actionable.
///
/// Only built from a verdict with `actionable = true`; see
/// [`DiscoveredTask::from_verdict`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredTask {
    /// Inherited from the originating `RawItem`
    pub id: String,

    pub source_kind: SourceKind,

    pub category: Category,

    pub title: String,

    pub description: String,

    pub priority: Priority,

    /// Always true for a constructed task
    pub actionable: bool,

    #[serde(default)]
    pub metadata: Metadata,
}

impl DiscoveredTask {
    /// Build a task from an item and its verdict, or `None` if the verdict
    /// is not actionable.
    pub fn from_verdict(item: RawItem, verdict: ClassificationVerdict) -> Option<Self> {
        if !verdict.actionable {
            return None;
        }

        Some(Self {
            id: item.id,
            source_kind: item.source_kind,
            category: verdict.category,
            title: item.title,
            description: verdict.description,
            priority: verdict.priority,
            actionable: true,
            metadata: item.captured_metadata,
        })
    }
}
