//! Review Gate
//!
//! Decides whether a pull request's review requirement is met. Cheap local
//! exemptions are tried first, in a fixed order; only when none applies is
//! the external review system asked for an approval.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PolicyOptions;
use crate::error::ApprovalError;
use crate::markdown::{clean_markdown, Divider};
use crate::payload::{EventPayload, PullRequestPayload};

/// Labels that waive the review requirement
pub const NO_REVIEW_REQUIRED_LABELS: [&str; 2] = ["no-review-required", "automerge"];

/// Looks up formal approvals for a pull request in an external review system
#[async_trait]
pub trait ApprovalChecker: Send + Sync {
    /// Whether at least one approving review exists.
    ///
    /// Zero reviews is `Ok(false)`; `Err` means the answer is unknown.
    async fn is_approved(&self, owner: &str, repo: &str, number: u64)
        -> Result<bool, ApprovalError>;
}

/// The rule that satisfied the review requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewBasis {
    SkipReviews,
    ExemptAuthor,
    ReviewComments,
    NoReviewExplanation,
    ExemptLabel,
    Approved,
}

impl std::fmt::Display for ReviewBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewBasis::SkipReviews => write!(f, "reviews skipped by policy"),
            ReviewBasis::ExemptAuthor => write!(f, "author exempt from review"),
            ReviewBasis::ReviewComments => write!(f, "review comments present"),
            ReviewBasis::NoReviewExplanation => write!(f, "no-review-required explanation"),
            ReviewBasis::ExemptLabel => write!(f, "no-review-required label"),
            ReviewBasis::Approved => write!(f, "approved"),
        }
    }
}

/// Result of the review gate
#[derive(Debug, Default)]
pub struct ReviewOutcome {
    /// Rule that satisfied review, `None` when unsatisfied
    pub basis: Option<ReviewBasis>,
    /// Set when the approval lookup failed; review then counts as unsatisfied
    pub error: Option<ApprovalError>,
}

impl ReviewOutcome {
    pub fn is_satisfied(&self) -> bool {
        self.basis.is_some()
    }
}

struct ReviewContext<'a> {
    pr: &'a PullRequestPayload,
    options: &'a PolicyOptions,
}

type ReviewRule = fn(&ReviewContext<'_>) -> bool;

/// Local exemptions in precedence order; the first satisfied rule wins
const LOCAL_RULES: &[(ReviewBasis, ReviewRule)] = &[
    (ReviewBasis::SkipReviews, skip_reviews),
    (ReviewBasis::ExemptAuthor, exempt_author),
    (ReviewBasis::ReviewComments, has_review_comments),
    (ReviewBasis::NoReviewExplanation, has_no_review_explanation),
    (ReviewBasis::ExemptLabel, has_exempt_label),
];

fn skip_reviews(ctx: &ReviewContext<'_>) -> bool {
    ctx.options.skip_reviews
}

fn exempt_author(ctx: &ReviewContext<'_>) -> bool {
    ctx.options.is_author_exempt(ctx.pr.author())
}

fn has_review_comments(ctx: &ReviewContext<'_>) -> bool {
    ctx.pr.review_comments > 0
}

// An empty explanation does not count
fn has_no_review_explanation(ctx: &ReviewContext<'_>) -> bool {
    Divider::NoReviewRequired
        .section_after(ctx.pr.body())
        .is_some_and(|explanation| !clean_markdown(explanation).is_empty())
}

fn has_exempt_label(ctx: &ReviewContext<'_>) -> bool {
    ctx.pr
        .label_names()
        .any(|name| NO_REVIEW_REQUIRED_LABELS.contains(&name))
}

/// Local exemption that applies to the PR, if any. Never calls out.
pub fn local_exemption(pr: &PullRequestPayload, options: &PolicyOptions) -> Option<ReviewBasis> {
    let ctx = ReviewContext { pr, options };
    LOCAL_RULES
        .iter()
        .find(|(_, rule)| rule(&ctx))
        .map(|(basis, _)| *basis)
}

/// Review requirement check backed by an [`ApprovalChecker`]
pub struct ReviewGate<'a> {
    checker: &'a dyn ApprovalChecker,
}

impl<'a> ReviewGate<'a> {
    pub fn new(checker: &'a dyn ApprovalChecker) -> Self {
        Self { checker }
    }

    pub async fn evaluate(&self, event: &EventPayload, options: &PolicyOptions) -> ReviewOutcome {
        let pr = &event.pull_request;

        if let Some(basis) = local_exemption(pr, options) {
            debug!(pr_number = pr.number, basis = %basis, "Review requirement satisfied locally");
            return ReviewOutcome {
                basis: Some(basis),
                error: None,
            };
        }

        let (owner, repo) = event.repository.owner_and_name();
        match self.checker.is_approved(owner, repo, pr.number).await {
            Ok(true) => ReviewOutcome {
                basis: Some(ReviewBasis::Approved),
                error: None,
            },
            Ok(false) => {
                debug!(pr_number = pr.number, "No approving review found");
                ReviewOutcome::default()
            }
            Err(e) => {
                warn!(
                    owner = %owner,
                    repo = %repo,
                    pr_number = pr.number,
                    error = %e,
                    "Approval lookup failed, treating review as unsatisfied"
                );
                ReviewOutcome {
                    basis: None,
                    error: Some(e),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::payload::{Label, UserPayload};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub checker that answers with a fixed result and counts calls
    pub(crate) struct StubApprovalChecker {
        response: fn() -> Result<bool, ApprovalError>,
        pub calls: AtomicUsize,
    }

    impl StubApprovalChecker {
        pub fn approving() -> Self {
            Self::with(|| Ok(true))
        }

        pub fn rejecting() -> Self {
            Self::with(|| Ok(false))
        }

        pub fn failing() -> Self {
            Self::with(|| Err(ApprovalError::Transport("connection reset".to_string())))
        }

        fn with(response: fn() -> Result<bool, ApprovalError>) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ApprovalChecker for StubApprovalChecker {
        async fn is_approved(
            &self,
            _owner: &str,
            _repo: &str,
            _number: u64,
        ) -> Result<bool, ApprovalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.response)()
        }
    }

    fn event(body: &str, labels: &[&str], review_comments: u64) -> EventPayload {
        let mut event = EventPayload::default();
        event.pull_request.number = 7;
        event.pull_request.body = Some(body.to_string());
        event.pull_request.user = UserPayload {
            login: "user".to_string(),
        };
        event.pull_request.labels = labels
            .iter()
            .map(|name| Label {
                name: name.to_string(),
            })
            .collect();
        event.pull_request.review_comments = review_comments;
        event.repository.full_name = "acme/widgets".to_string();
        event
    }

    #[test]
    fn test_skip_reviews_takes_precedence() {
        let event = event("", &[], 0);
        let opts = PolicyOptions::new().skip_reviews(true);
        assert_eq!(
            local_exemption(&event.pull_request, &opts),
            Some(ReviewBasis::SkipReviews)
        );
    }

    #[test]
    fn test_exempt_author() {
        let event = event("", &[], 0);

        let opts = PolicyOptions::new().skip_review_for("foo,user,bar");
        assert_eq!(
            local_exemption(&event.pull_request, &opts),
            Some(ReviewBasis::ExemptAuthor)
        );

        let opts = PolicyOptions::new().skip_review_for("foo,bar");
        assert_eq!(local_exemption(&event.pull_request, &opts), None);
    }

    #[test]
    fn test_review_comments_checked_before_labels() {
        let event = event("", &["automerge"], 1);
        assert_eq!(
            local_exemption(&event.pull_request, &PolicyOptions::default()),
            Some(ReviewBasis::ReviewComments)
        );
    }

    #[test]
    fn test_no_review_explanation() {
        let event = event("Test plan: done\nNo review required: trust me", &[], 0);
        assert_eq!(
            local_exemption(&event.pull_request, &PolicyOptions::default()),
            Some(ReviewBasis::NoReviewExplanation)
        );
    }

    #[test]
    fn test_empty_no_review_explanation_falls_through() {
        let body = include_str!("../testdata/pull_request_body/no-review-required-empty.md");
        let event = event(body, &[], 0);
        assert_eq!(
            local_exemption(&event.pull_request, &PolicyOptions::default()),
            None
        );
    }

    #[test]
    fn test_exempt_labels() {
        for label in NO_REVIEW_REQUIRED_LABELS {
            let event = event("", &["bug", label], 0);
            assert_eq!(
                local_exemption(&event.pull_request, &PolicyOptions::default()),
                Some(ReviewBasis::ExemptLabel)
            );
        }

        let event = event("", &["random-label"], 0);
        assert_eq!(
            local_exemption(&event.pull_request, &PolicyOptions::default()),
            None
        );
    }

    #[tokio::test]
    async fn test_review_comments_skip_approval_lookup() {
        let checker = StubApprovalChecker::approving();
        let outcome = ReviewGate::new(&checker)
            .evaluate(&event("", &[], 1), &PolicyOptions::default())
            .await;

        assert_eq!(outcome.basis, Some(ReviewBasis::ReviewComments));
        assert_eq!(checker.call_count(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_approval_checker() {
        let checker = StubApprovalChecker::approving();
        let outcome = ReviewGate::new(&checker)
            .evaluate(&event("", &[], 0), &PolicyOptions::default())
            .await;

        assert_eq!(outcome.basis, Some(ReviewBasis::Approved));
        assert!(outcome.error.is_none());
        assert_eq!(checker.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unapproved() {
        let checker = StubApprovalChecker::rejecting();
        let outcome = ReviewGate::new(&checker)
            .evaluate(&event("", &[], 0), &PolicyOptions::default())
            .await;

        assert!(!outcome.is_satisfied());
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_checker_failure_is_unsatisfied_with_error() {
        let checker = StubApprovalChecker::failing();
        let outcome = ReviewGate::new(&checker)
            .evaluate(&event("", &[], 0), &PolicyOptions::default())
            .await;

        assert!(!outcome.is_satisfied());
        assert!(matches!(outcome.error, Some(ApprovalError::Transport(_))));
    }
}
