//! PR Auditor Library
//!
//! Compliance gate for GitHub pull requests: a PR may merge once it documents
//! a test plan and has been reviewed (or is exempt from review), unless it
//! targets the protected branch.
//!
//! ## Checks
//!
//! - **Test plan**: content after a `### Test Plan` heading or `Test plan:`
//!   label, with template HTML comments stripped
//! - **Review**: policy skip, exempt author, existing review comments, a
//!   `No review required:` explanation, an exemption label, or finally an
//!   approving review looked up through the GitHub API
//! - **Protected branch**: merges into it are always flagged
//!
//! ## Example Pipeline
//!
//! ```bash
//! # Inside a GitHub Actions job triggered by pull_request
//! pr-auditor \
//!   --protected-branch release \
//!   --skip-review-for-users dependabot[bot],renovate[bot]
//!
//! # Machine-readable output
//! pr-auditor --payload-path event.json --format json
//! ```

pub mod auth;
pub mod check;
pub mod config;
pub mod error;
pub mod github;
pub mod markdown;
pub mod payload;
pub mod plan;
pub mod report;
pub mod review;

pub use check::{evaluate, EvaluationResult};
pub use config::PolicyOptions;
pub use error::{ApprovalError, EvaluationError};
pub use github::{GithubApprovalChecker, GithubClientConfig};
pub use payload::EventPayload;
pub use review::{ApprovalChecker, ReviewBasis};
