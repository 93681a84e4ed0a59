//! GitHub Review Lookup
//!
//! [`ApprovalChecker`] backed by the GitHub REST API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::ApprovalError;
use crate::review::ApprovalChecker;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "lornu-ai-pr-auditor";

/// Largest page size the reviews endpoint accepts
const REVIEWS_PER_PAGE: u32 = 100;

/// Connection settings for the GitHub API
#[derive(Debug, Clone)]
pub struct GithubClientConfig {
    /// API base URL, e.g. `https://api.github.com`
    pub api_url: String,
    /// Installation token or PAT; anonymous requests only work for public repos
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GithubClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client with a per-request timeout, shared by token exchange and review lookups
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, ApprovalError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

#[derive(Debug, Deserialize)]
struct Review {
    id: u64,
    state: String,
}

/// Checks for `APPROVED` reviews on a pull request
pub struct GithubApprovalChecker {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GithubApprovalChecker {
    pub fn new(config: GithubClientConfig) -> Result<Self, ApprovalError> {
        let client = build_client(config.timeout)?;
        Ok(Self::with_client(client, &config.api_url, config.token))
    }

    /// Reuse an already configured client
    pub fn with_client(client: reqwest::Client, api_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<(Vec<Review>, Option<String>), ApprovalError> {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApprovalError::Api { status, body });
        }

        let next = next_page_url(response.headers());
        let reviews = response
            .json()
            .await
            .map_err(|e| ApprovalError::Decode(e.to_string()))?;
        Ok((reviews, next))
    }
}

/// Target of the `rel="next"` entry in a `Link` response header
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| param.trim() == "rel=\"next\"");
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

#[async_trait]
impl ApprovalChecker for GithubApprovalChecker {
    async fn is_approved(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<bool, ApprovalError> {
        let mut next = Some(format!(
            "{}/repos/{}/{}/pulls/{}/reviews?per_page={}",
            self.api_url, owner, repo, number, REVIEWS_PER_PAGE
        ));
        let mut pages = 0;
        let mut seen = 0;

        while let Some(url) = next.take() {
            let (reviews, next_url) = self.fetch_page(&url).await?;
            pages += 1;
            seen += reviews.len();

            if let Some(approval) = reviews.iter().find(|review| review.state == "APPROVED") {
                debug!(
                    repo = %format!("{owner}/{repo}"),
                    pr_number = number,
                    pages,
                    reviews = seen,
                    approval_id = approval.id,
                    "Found approving review"
                );
                return Ok(true);
            }
            next = next_url;
        }

        debug!(
            repo = %format!("{owner}/{repo}"),
            pr_number = number,
            pages,
            reviews = seen,
            "No approving review"
        );
        Ok(false)
    }
}
