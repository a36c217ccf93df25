//! Minimal GitHub REST client for the three calls the pipeline makes:
//! listing a pull request's changed files, posting the analysis comment,
//! and setting a commit status on the head SHA.

use ripple_core::{ChangeKind, ChangeRecord};
use ripple_graph::RiskLevel;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("ripple/", env!("CARGO_PKG_VERSION"));
const STATUS_CONTEXT: &str = "ripple/impact";

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("github request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// One entry from `GET /repos/{owner}/{repo}/pulls/{number}/files`.
#[derive(Debug, Deserialize)]
struct FileEntry {
    filename: String,
    status: String,
    /// Absent for binary files and for very large diffs.
    patch: Option<String>,
}

#[derive(Debug)]
pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base(token, DEFAULT_API_BASE)
    }

    /// Points the client at a different API root, for tests and GitHub
    /// Enterprise installs.
    pub fn with_base(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            api_base: api_base.into(),
        }
    }

    /// Lists the files changed by a pull request, patches included.
    pub async fn fetch_changed_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<ChangeRecord>, GitHubError> {
        let url = format!(
            "{}/repos/{owner}/{repo}/pulls/{number}/files",
            self.api_base
        );
        debug!(%url, "fetching changed files");
        let entries: Vec<FileEntry> = self
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let records = entries
            .into_iter()
            .map(|e| ChangeRecord::new(e.filename, ChangeKind::from_status(&e.status), e.patch))
            .collect::<Vec<_>>();
        info!(files = records.len(), pr = number, "fetched changed files");
        Ok(records)
    }

    /// Posts a Markdown comment on the pull request's conversation.
    pub async fn post_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), GitHubError> {
        let url = format!(
            "{}/repos/{owner}/{repo}/issues/{number}/comments",
            self.api_base
        );
        self.post(&url)
            .json(&json!({ "body": body }))
            .send()
            .await?
            .error_for_status()?;
        info!(pr = number, "posted impact comment");
        Ok(())
    }

    /// Sets the `ripple/impact` commit status on `sha`. Every risk level
    /// short of critical reports success so merges stay unblocked.
    pub async fn set_commit_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        risk: RiskLevel,
    ) -> Result<(), GitHubError> {
        let url = format!("{}/repos/{owner}/{repo}/statuses/{sha}", self.api_base);
        let state = if risk == RiskLevel::Critical {
            "failure"
        } else {
            "success"
        };
        self.post(&url)
            .json(&json!({
                "state": state,
                "description": format!("Ripple risk: {}", risk.as_str()),
                "context": STATUS_CONTEXT,
            }))
            .send()
            .await?
            .error_for_status()?;
        info!(sha, state, risk = risk.as_str(), "set commit status");
        Ok(())
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.decorate(self.http.get(url))
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.decorate(self.http.post(url))
    }

    fn decorate(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
    }
}
