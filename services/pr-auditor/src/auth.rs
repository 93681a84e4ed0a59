//! GitHub Authentication
//!
//! Resolves the bearer token used for review lookups: either a token handed
//! in directly (`GITHUB_TOKEN` in Actions) or a short-lived installation
//! token minted from GitHub App credentials.

use anyhow::{Context, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Backdating applied to `iat` so a fast local clock is not rejected
const CLOCK_SKEW_SECS: u64 = 60;

/// GitHub refuses App JWTs that live longer than 10 minutes
const JWT_TTL_SECS: u64 = 600;

/// JWT claims for GitHub App authentication
#[derive(Debug, Serialize)]
pub struct GitHubAppClaims {
    /// Issued at time (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issuer (GitHub App ID)
    pub iss: String,
}

impl GitHubAppClaims {
    /// Claims for a token minted at `now` (Unix seconds)
    pub fn issued_at(app_id: &str, now: u64) -> Self {
        Self {
            iat: now.saturating_sub(CLOCK_SKEW_SECS),
            exp: now + JWT_TTL_SECS,
            iss: app_id.to_string(),
        }
    }
}

/// Response from GitHub installation token endpoint
#[derive(Debug, Deserialize)]
struct InstallationToken {
    token: String,
    expires_at: String,
}

/// Where API credentials come from
#[derive(Debug, Clone)]
pub enum GithubCredentials {
    /// Anonymous access
    None,
    /// Installation token or PAT
    Token(String),
    /// GitHub App credentials exchanged for an installation token
    App {
        app_id: String,
        private_key_path: PathBuf,
        installation_id: u64,
    },
}

impl GithubCredentials {
    /// Produce the bearer token for API calls, `None` for anonymous access
    pub async fn resolve_token(
        &self,
        client: &reqwest::Client,
        api_url: &str,
    ) -> Result<Option<String>> {
        match self {
            GithubCredentials::None => Ok(None),
            GithubCredentials::Token(token) => Ok(Some(token.clone())),
            GithubCredentials::App {
                app_id,
                private_key_path,
                installation_id,
            } => {
                let key = std::fs::read(private_key_path).with_context(|| {
                    format!("Failed to read private key: {}", private_key_path.display())
                })?;
                let jwt = generate_jwt(app_id, &key)?;
                let token =
                    exchange_installation_token(client, api_url, &jwt, *installation_id).await?;
                Ok(Some(token))
            }
        }
    }
}

/// Sign an RS256 App JWT with the PEM-encoded private key
pub fn generate_jwt(app_id: &str, private_key_pem: &[u8]) -> Result<String> {
    let key = EncodingKey::from_rsa_pem(private_key_pem).context("Failed to parse private key")?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("Failed to get current time")?;

    let claims = GitHubAppClaims::issued_at(app_id, now.as_secs());
    encode(&Header::new(Algorithm::RS256), &claims, &key).context("Failed to encode JWT")
}

/// Exchange an App JWT for an installation access token
pub async fn exchange_installation_token(
    client: &reqwest::Client,
    api_url: &str,
    jwt: &str,
    installation_id: u64,
) -> Result<String> {
    let url = format!(
        "{}/app/installations/{}/access_tokens",
        api_url.trim_end_matches('/'),
        installation_id
    );
    debug!(installation_id, "Requesting installation token");

    let response = client
        .post(&url)
        .bearer_auth(jwt)
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", "lornu-ai-pr-auditor")
        .header("X-GitHub-Api-Version", "2022-11-28")
        .send()
        .await
        .context("Failed to send request to GitHub API")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("GitHub API error ({}): {}", status, body);
    }

    let token = response
        .json::<InstallationToken>()
        .await
        .context("Failed to parse installation token response")?;

    info!(
        installation_id,
        expires_at = %token.expires_at,
        "Installation token issued"
    );
    Ok(token.token)
}
