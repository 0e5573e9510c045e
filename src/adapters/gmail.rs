//! Gmail adapter.
//!
//! Lists inbox messages matching a Gmail search, fetches each in full and
//! decodes its body, preferring the plain-text MIME part.

use std::sync::Arc;

use async_trait::async_trait;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::Deserialize;
use tracing::{debug, warn};

use super::SourceAdapter;
use crate::domain::{RawItem, SourceKind};
use crate::error::PipelineError;

pub const DEFAULT_QUERY: &str = "is:unread in:inbox";

/// Gmail encodes bodies as URL-safe base64, with or without padding
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailMessage {
    pub id: String,
    pub thread_id: Option<String>,
    pub snippet: Option<String>,
    pub payload: Option<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    pub mime_type: Option<String>,
    #[serde(default)]
    pub headers: Vec<Header>,
    pub body: Option<PartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartBody {
    pub data: Option<String>,
}

impl GmailMessage {
    /// First header with the given name, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload.as_ref().and_then(|p| {
            p.headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.as_str())
        })
    }

    /// Decoded body: the payload's own data if present, otherwise the first
    /// `text/plain` part found depth-first.
    pub fn body_text(&self) -> String {
        let Some(payload) = &self.payload else {
            return String::new();
        };

        payload
            .body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .and_then(decode_body)
            .or_else(|| find_plain_text(&payload.parts))
            .unwrap_or_default()
    }
}

fn find_plain_text(parts: &[MessagePart]) -> Option<String> {
    for part in parts {
        if part.mime_type.as_deref() == Some("text/plain") {
            if let Some(text) = part.body.as_ref().and_then(|b| b.data.as_deref()).and_then(decode_body) {
                return Some(text);
            }
        }
        if let Some(text) = find_plain_text(&part.parts) {
            return Some(text);
        }
    }
    None
}

fn decode_body(data: &str) -> Option<String> {
    match BODY_ENGINE.decode(data) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!(error = %e, "Undecodable message body");
            None
        }
    }
}

/// Read-only transport to a mailbox
#[async_trait]
pub trait MailStore: Send + Sync {
    async fn list_messages(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<MessageRef>>;

    async fn message(&self, id: &str) -> anyhow::Result<GmailMessage>;
}

/// Gmail source adapter
pub struct GmailAdapter {
    store: Arc<dyn MailStore>,
}

impl GmailAdapter {
    pub fn new(store: Arc<dyn MailStore>) -> Self {
        Self { store }
    }

    fn to_raw_item(message: GmailMessage) -> RawItem {
        let subject = message.header("Subject").unwrap_or("No subject").to_string();
        let from = message.header("From").unwrap_or("Unknown sender").to_string();
        let date = message.header("Date").unwrap_or_default().to_string();
        let body = message.body_text();

        let mut item = RawItem::new(
            message.id,
            SourceKind::Gmail,
            format!("Email: {}", subject),
            body,
        )
        .with_author(from.clone())
        .with_metadata("from", from)
        .with_metadata("subject", subject)
        .with_metadata("date", date);

        if let Some(thread_id) = message.thread_id {
            item = item.with_metadata("threadId", thread_id);
        }
        if let Some(snippet) = message.snippet {
            item = item.with_metadata("snippet", snippet);
        }
        item
    }
}

#[async_trait]
impl SourceAdapter for GmailAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Gmail
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<RawItem>, PipelineError> {
        let refs = self
            .store
            .list_messages(query, limit)
            .await
            .map_err(|e| PipelineError::source_unavailable(SourceKind::Gmail, format!("{:#}", e)))?;

        debug!(count = refs.len(), "Gmail search returned messages");

        let mut items = Vec::with_capacity(refs.len());
        for message_ref in refs.into_iter().take(limit) {
            let message = self.store.message(&message_ref.id).await;
            match message {
                Ok(message) => items.push(Self::to_raw_item(message)),
                Err(e) => {
                    warn!(message_id = %message_ref.id, error = %e, "Skipping message that could not be read");
                }
            }
        }

        Ok(items)
    }
}
