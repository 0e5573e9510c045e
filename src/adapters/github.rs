//! GitHub issues adapter.
//!
//! Uses the issue search API, so the query is any GitHub search string
//! (default: open issues assigned to the token's user).

use async_trait::async_trait;
use serde::Deserialize;

use super::SourceAdapter;
use crate::domain::{RawItem, SourceKind};
use crate::error::PipelineError;

pub const DEFAULT_QUERY: &str = "is:open is:issue assignee:@me";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Issue>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    id: u64,
    number: u64,
    title: String,
    body: Option<String>,
    html_url: String,
    repository_url: String,
    updated_at: Option<String>,
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

/// GitHub issue search adapter
pub struct GithubAdapter {
    client: reqwest::Client,
    token: String,
    api_url: String,
}

impl GithubAdapter {
    pub fn new(token: String) -> Self {
        Self::with_api_url(token, DEFAULT_API_URL.to_string())
    }

    pub fn with_api_url(token: String, api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn to_raw_item(issue: Issue) -> RawItem {
        // repository_url ends in /repos/{owner}/{repo}
        let repository = issue
            .repository_url
            .split("/repos/")
            .nth(1)
            .unwrap_or(&issue.repository_url)
            .to_string();

        let mut item = RawItem::new(
            issue.id.to_string(),
            SourceKind::Github,
            issue.title,
            issue.body.unwrap_or_default(),
        )
        .with_metadata("url", issue.html_url)
        .with_metadata("repository", repository)
        .with_metadata("number", issue.number);

        if let Some(updated_at) = issue.updated_at {
            item = item.with_metadata("updatedAt", updated_at);
        }
        if let Some(user) = issue.user {
            item = item.with_author(user.login);
        }
        item
    }

    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<SearchResponse> {
        let response = self
            .client
            .get(format!("{}/search/issues", self.api_url))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "executioner")
            .query(&[("q", query.to_string()), ("per_page", limit.to_string())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("GitHub API error ({}): {}", status, body);
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl SourceAdapter for GithubAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Github
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<RawItem>, PipelineError> {
        let response = self
            .search(query, limit)
            .await
            .map_err(|e| PipelineError::source_unavailable(SourceKind::Github, format!("{:#}", e)))?;

        Ok(response
            .items
            .into_iter()
            .take(limit)
            .map(Self::to_raw_item)
            .collect())
    }
}
