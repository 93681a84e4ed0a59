//! Audit Report
//!
//! Caller-facing summary of an evaluation, rendered as text or JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::check::EvaluationResult;
use crate::payload::EventPayload;
use crate::review::ReviewBasis;

/// Output format for the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub repository: String,
    pub pr_number: u64,
    pub base_branch: String,
    pub head_branch: String,
    pub head_sha: Option<String>,
    pub mergeable: bool,
    pub review_satisfied: bool,
    pub review_basis: Option<ReviewBasis>,
    pub test_plan_exempt: bool,
    pub test_plan: String,
    pub protected_branch: bool,
    pub error: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

impl AuditReport {
    pub fn new(event: &EventPayload, result: &EvaluationResult) -> Self {
        let (owner, name) = event.repository.owner_and_name();
        Self {
            repository: format!("{owner}/{name}"),
            pr_number: event.pull_request.number,
            base_branch: event.pull_request.base_branch().to_string(),
            head_branch: event.pull_request.head_branch().to_string(),
            head_sha: event.pull_request.head.sha.clone(),
            mergeable: result.is_mergeable(),
            review_satisfied: result.review_satisfied,
            review_basis: result.review_basis,
            test_plan_exempt: result.test_plan_exempt,
            test_plan: result.test_plan.clone(),
            protected_branch: result.protected_branch,
            error: result.error.as_ref().map(ToString::to_string),
            evaluated_at: Utc::now(),
        }
    }

    /// Reasons the pull request cannot be merged, empty when mergeable
    pub fn failures(&self) -> Vec<String> {
        let mut failures = Vec::new();
        if !self.test_plan_exempt && self.test_plan.is_empty() {
            failures.push("No test plan found in the pull request description".to_string());
        }
        if !self.review_satisfied {
            failures.push("Pull request has not been reviewed or approved".to_string());
        }
        if self.protected_branch {
            failures.push(format!(
                "Merges into protected branch '{}' must be justified",
                self.base_branch
            ));
        }
        if let Some(error) = &self.error {
            failures.push(error.clone());
        }
        failures
    }

    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(self),
            OutputFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        let mut out = format!(
            "{} {} #{} {} -> {}\n",
            if self.mergeable { "✅" } else { "❌" },
            self.repository,
            self.pr_number,
            self.head_branch,
            self.base_branch
        );
        if let Some(sha) = &self.head_sha {
            out.push_str(&format!("  head: {sha}\n"));
        }

        match self.review_basis {
            Some(basis) => out.push_str(&format!("  review: satisfied ({basis})\n")),
            None => out.push_str("  review: missing\n"),
        }
        if self.test_plan.is_empty() {
            let status = if self.test_plan_exempt { "exempt" } else { "missing" };
            out.push_str(&format!("  test plan: {status}\n"));
        } else {
            out.push_str("  test plan:\n");
            for line in self.test_plan.lines() {
                out.push_str(&format!("    {line}\n"));
            }
        }
        for failure in self.failures() {
            out.push_str(&format!("  - {failure}\n"));
        }
        out
    }
}
