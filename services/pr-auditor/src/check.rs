//! Compliance Evaluation
//!
//! Combines the review gate and the test plan extraction into a single
//! merge-readiness verdict for a pull request.

use tracing::{debug, info};

use crate::config::PolicyOptions;
use crate::error::EvaluationError;
use crate::payload::EventPayload;
use crate::plan::extract_test_plan;
use crate::review::{ApprovalChecker, ReviewBasis, ReviewGate};

/// Outcome of auditing one pull request
#[derive(Debug)]
pub struct EvaluationResult {
    /// Any review has been made on the PR, or the PR is exempt from review
    pub review_satisfied: bool,
    /// Rule that satisfied the review requirement
    pub review_basis: Option<ReviewBasis>,
    /// The test plan is not required for audit
    pub test_plan_exempt: bool,
    /// Cleaned content following the test plan divider, empty if none
    pub test_plan: String,
    /// The PR targets the protected branch; such merges always need justification
    pub protected_branch: bool,
    /// Unrecoverable issue hit during the evaluation
    pub error: Option<EvaluationError>,
}

impl EvaluationResult {
    pub fn is_test_plan_satisfied(&self) -> bool {
        self.test_plan_exempt || !self.test_plan.is_empty()
    }

    /// Test plan and review are satisfied and the PR does not target the protected branch
    pub fn is_mergeable(&self) -> bool {
        self.is_test_plan_satisfied() && self.review_satisfied && !self.protected_branch
    }
}

/// Audit a pull request event against `options`.
///
/// Review and test plan are checked independently. The protected branch is
/// only considered when the body carries a test plan divider.
pub async fn evaluate(
    event: &EventPayload,
    options: &PolicyOptions,
    checker: &dyn ApprovalChecker,
) -> EvaluationResult {
    let pr = &event.pull_request;

    // Approvals may come without comments, so the gate can end up asking GitHub
    let review = ReviewGate::new(checker).evaluate(event, options).await;
    let review_satisfied = review.is_satisfied();
    let error = review.error.map(EvaluationError::from);

    let Some(test_plan) = extract_test_plan(pr.body()) else {
        debug!(pr_number = pr.number, "No test plan divider found");
        return EvaluationResult {
            review_satisfied,
            review_basis: review.basis,
            test_plan_exempt: options.skip_test_plan,
            test_plan: String::new(),
            protected_branch: false,
            error,
        };
    };

    let protected_branch = options.is_protected(pr.base_branch());
    if protected_branch {
        info!(
            pr_number = pr.number,
            base = %pr.base_branch(),
            "Pull request targets protected branch"
        );
    }

    EvaluationResult {
        review_satisfied,
        review_basis: review.basis,
        test_plan_exempt: options.skip_test_plan,
        test_plan,
        protected_branch,
        error,
    }
}
