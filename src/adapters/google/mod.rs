//! Google Workspace transport shared by the Drive and Gmail adapters.

mod auth;

pub use auth::{GoogleAuth, GoogleCredentials, SCOPES};

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::drive::{DocumentStore, DriveFile, GoogleDocument};
use super::gmail::{GmailMessage, MailStore, MessageRef};

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DOCS_URL: &str = "https://docs.googleapis.com/v1/documents";
const GMAIL_MESSAGES_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

/// Authenticated read-only client for Drive, Docs and Gmail
pub struct GoogleWorkspace {
    auth: Arc<GoogleAuth>,
    client: reqwest::Client,
}

impl GoogleWorkspace {
    pub fn new(auth: Arc<GoogleAuth>) -> Self {
        Self {
            auth,
            client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let token = self.auth.access_token().await?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Google API error ({}): {}", status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }
}

#[async_trait]
impl DocumentStore for GoogleWorkspace {
    async fn search_files(&self, query: &str, page_size: usize) -> Result<Vec<DriveFile>> {
        let list: FileList = self
            .get_json(
                DRIVE_FILES_URL,
                &[
                    ("q", query.to_string()),
                    ("fields", "files(id, name, modifiedTime, webViewLink)".to_string()),
                    ("orderBy", "modifiedTime desc".to_string()),
                    ("pageSize", page_size.to_string()),
                ],
            )
            .await?;
        Ok(list.files)
    }

    async fn document(&self, id: &str) -> Result<GoogleDocument> {
        self.get_json(&format!("{}/{}", DOCS_URL, id), &[]).await
    }
}

#[async_trait]
impl MailStore for GoogleWorkspace {
    async fn list_messages(&self, query: &str, max_results: usize) -> Result<Vec<MessageRef>> {
        let list: MessageList = self
            .get_json(
                GMAIL_MESSAGES_URL,
                &[("q", query.to_string()), ("maxResults", max_results.to_string())],
            )
            .await?;
        Ok(list.messages)
    }

    async fn message(&self, id: &str) -> Result<GmailMessage> {
        self.get_json(
            &format!("{}/{}", GMAIL_MESSAGES_URL, id),
            &[("format", "full".to_string())],
        )
        .await
    }
}
