//! Google Drive adapter.
//!
//! Searches Drive for documents that look unfinished, pulls each document's
//! structured body and flattens it to plain text.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{truncate_chars, SourceAdapter};
use crate::domain::{RawItem, SourceKind};
use crate::error::PipelineError;

/// Matches documents whose names suggest unfinished work
pub const DEFAULT_QUERY: &str = "(name contains 'draft' or name contains 'WIP' or name contains 'TODO' or name contains 'incomplete') and mimeType='application/vnd.google-apps.document'";

const PREVIEW_CHARS: usize = 200;

/// A file entry from a Drive search
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub modified_time: Option<String>,
    pub web_view_link: Option<String>,
}

/// A Docs API document, reduced to the parts we read
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleDocument {
    #[serde(default)]
    pub body: Option<DocumentBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentBody {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuralElement {
    pub paragraph: Option<Paragraph>,
    pub table: Option<Table>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

impl GoogleDocument {
    /// Flatten the structured body into plain text, one line per element
    pub fn plain_text(&self) -> String {
        self.body
            .as_ref()
            .map(|body| flatten(&body.content))
            .unwrap_or_default()
    }
}

fn flatten(elements: &[StructuralElement]) -> String {
    elements
        .iter()
        .map(|element| {
            if let Some(paragraph) = &element.paragraph {
                paragraph
                    .elements
                    .iter()
                    .filter_map(|e| e.text_run.as_ref())
                    .map(|run| run.content.as_str())
                    .collect::<String>()
            } else if let Some(table) = &element.table {
                table
                    .table_rows
                    .iter()
                    .flat_map(|row| row.table_cells.iter())
                    .map(|cell| flatten(&cell.content))
                    .collect::<Vec<_>>()
                    .join("\n")
            } else {
                String::new()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read-only transport to a document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn search_files(&self, query: &str, page_size: usize) -> anyhow::Result<Vec<DriveFile>>;

    async fn document(&self, id: &str) -> anyhow::Result<GoogleDocument>;
}

/// Drive source adapter
pub struct DriveAdapter {
    store: Arc<dyn DocumentStore>,
}

impl DriveAdapter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn to_raw_item(file: DriveFile, content: String) -> RawItem {
        let preview = truncate_chars(&content, PREVIEW_CHARS).to_string();
        let mut item = RawItem::new(file.id, SourceKind::Drive, file.name, content);

        if let Some(url) = file.web_view_link {
            item = item.with_metadata("url", url);
        }
        if let Some(modified) = file.modified_time {
            item = item.with_metadata("modifiedTime", modified);
        }
        item.with_metadata("contentPreview", preview)
    }
}

#[async_trait]
impl SourceAdapter for DriveAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Drive
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<RawItem>, PipelineError> {
        let files = self
            .store
            .search_files(query, limit)
            .await
            .map_err(|e| PipelineError::source_unavailable(SourceKind::Drive, format!("{:#}", e)))?;

        debug!(count = files.len(), "Drive search returned files");

        let mut items = Vec::with_capacity(files.len());
        for file in files.into_iter().take(limit) {
            let document = self.store.document(&file.id).await;
            match document {
                Ok(document) => items.push(Self::to_raw_item(file, document.plain_text())),
                Err(e) => {
                    warn!(file_id = %file.id, error = %e, "Skipping document whose body could not be read");
                }
            }
        }

        Ok(items)
    }
}
