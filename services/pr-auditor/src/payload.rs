//! Pull Request Event Payload
//!
//! Serde model of the subset of the GitHub `pull_request` event the auditor
//! reads. In GitHub Actions the full event JSON sits at `GITHUB_EVENT_PATH`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A `pull_request` event as delivered by GitHub
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPayload {
    pub pull_request: PullRequestPayload,
    pub repository: RepositoryPayload,
}

/// Pull request fields consulted by the policy checks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestPayload {
    pub number: u64,
    /// Description markdown; GitHub sends `null` when it was left empty
    #[serde(default)]
    pub body: Option<String>,
    pub user: UserPayload,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Number of review comments already posted on the PR
    #[serde(default)]
    pub review_comments: u64,
    pub base: RefPayload,
    #[serde(default)]
    pub head: RefPayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPayload {
    pub login: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

/// A branch reference (`base` or `head`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefPayload {
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub sha: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub owner: UserPayload,
}

impl EventPayload {
    /// Parse an event payload from raw JSON
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("Failed to parse pull_request event payload")
    }

    /// Load and parse an event payload file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read event payload: {}", path.display()))?;
        Self::from_slice(&bytes)
    }
}

impl PullRequestPayload {
    /// Description text, empty when none was provided
    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    pub fn author(&self) -> &str {
        &self.user.login
    }

    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|label| label.name.as_str())
    }

    pub fn base_branch(&self) -> &str {
        &self.base.git_ref
    }

    pub fn head_branch(&self) -> &str {
        &self.head.git_ref
    }
}

impl RepositoryPayload {
    /// Owner login and repository name.
    ///
    /// Falls back to splitting `full_name` (`owner/repo`) when the nested
    /// fields are missing from the payload.
    pub fn owner_and_name(&self) -> (&str, &str) {
        if !self.owner.login.is_empty() && !self.name.is_empty() {
            return (self.owner.login.as_str(), self.name.as_str());
        }
        match self.full_name.split_once('/') {
            Some((owner, name)) => (owner, name),
            None => (self.owner.login.as_str(), self.name.as_str()),
        }
    }
}
