//! PR Audit Tool
//!
//! Checks a pull request event for a test plan and review before merge.
//! Exits non-zero when the pull request is not mergeable.
//!
//! ## Usage
//! ```bash
//! # In GitHub Actions (GITHUB_EVENT_PATH and GITHUB_TOKEN are set by the runner)
//! pr-auditor --protected-branch release
//!
//! # Locally against a saved payload
//! pr-auditor \
//!   --payload-path ./event.json \
//!   --token <TOKEN> \
//!   --skip-review-for-users dependabot[bot] \
//!   --format json
//!
//! # Authenticate as a GitHub App instead of a token
//! GITHUB_APP_ID=123456 \
//! GITHUB_PRIVATE_KEY_PATH=./key.pem \
//! GITHUB_INSTALLATION_ID=78901234 \
//! pr-auditor --payload-path ./event.json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pr_auditor::auth::GithubCredentials;
use pr_auditor::github::{build_client, DEFAULT_API_URL};
use pr_auditor::report::{AuditReport, OutputFormat};
use pr_auditor::{evaluate, EventPayload, GithubApprovalChecker, PolicyOptions};

/// PR Audit Tool
#[derive(Parser, Debug)]
#[command(name = "pr-auditor")]
#[command(about = "Check pull requests for a test plan and review before merge")]
#[command(version)]
struct Args {
    /// Path to the pull_request event payload JSON
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    payload_path: PathBuf,

    /// GitHub token (installation token or PAT)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub App ID, used with --private-key-path and --installation-id
    #[arg(long, env = "GITHUB_APP_ID", requires_all = ["private_key_path", "installation_id"])]
    app_id: Option<String>,

    /// Path to the GitHub App private key PEM file
    #[arg(long, env = "GITHUB_PRIVATE_KEY_PATH")]
    private_key_path: Option<PathBuf>,

    /// GitHub App Installation ID
    #[arg(long, env = "GITHUB_INSTALLATION_ID")]
    installation_id: Option<u64>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Timeout in seconds for GitHub API requests
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Consider review satisfied for every pull request
    #[arg(long)]
    skip_check_reviews: bool,

    /// Do not require a test plan
    #[arg(long)]
    skip_check_test_plan: bool,

    /// Authors exempt from review (comma-separated logins)
    #[arg(long, default_value = "")]
    skip_review_for_users: String,

    /// Branch whose merges are always flagged as exceptional
    #[arg(long, default_value = "")]
    protected_branch: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn credentials(&self) -> GithubCredentials {
        match (&self.app_id, &self.private_key_path, self.installation_id) {
            (Some(app_id), Some(private_key_path), Some(installation_id)) => {
                GithubCredentials::App {
                    app_id: app_id.clone(),
                    private_key_path: private_key_path.clone(),
                    installation_id,
                }
            }
            _ => match &self.token {
                Some(token) if !token.is_empty() => GithubCredentials::Token(token.clone()),
                _ => GithubCredentials::None,
            },
        }
    }

    fn policy(&self) -> PolicyOptions {
        PolicyOptions::new()
            .skip_reviews(self.skip_check_reviews)
            .skip_review_for(&self.skip_review_for_users)
            .skip_test_plan(self.skip_check_test_plan)
            .protected_branch(self.protected_branch.as_str())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout only carries the report
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let event = EventPayload::from_path(&args.payload_path)?;
    let (owner, repo) = event.repository.owner_and_name();
    info!(
        repo = %format!("{owner}/{repo}"),
        pr_number = event.pull_request.number,
        "Auditing pull request"
    );

    let credentials = args.credentials();
    if matches!(credentials, GithubCredentials::None) {
        warn!("No GitHub credentials provided; approval lookups are anonymous.");
    }
    let client = build_client(Duration::from_secs(args.timeout_secs))
        .context("Failed to create GitHub client")?;
    let token = credentials
        .resolve_token(&client, &args.api_url)
        .await
        .context("Failed to obtain GitHub token")?;
    let checker = GithubApprovalChecker::with_client(client, &args.api_url, token);

    let result = evaluate(&event, &args.policy(), &checker).await;
    let report = AuditReport::new(&event, &result);
    println!("{}", report.render(args.format)?);

    if !report.mergeable {
        for failure in report.failures() {
            warn!("{}", failure);
        }
        std::process::exit(1);
    }

    info!("Pull request is mergeable");
    Ok(())
}
