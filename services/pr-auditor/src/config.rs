//! Audit Policy Options
//!
//! Knobs that relax or tighten the compliance checks for a repository.

use serde::{Deserialize, Serialize};

/// Policy the pull request is evaluated against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOptions {
    /// Treat review as always satisfied
    pub skip_reviews: bool,
    /// Author logins exempted from review
    pub skip_review_for_authors: Vec<String>,
    /// Tolerate a missing test plan
    pub skip_test_plan: bool,
    /// Merges into this branch are always flagged as exceptional
    pub protected_branch: Option<String>,
}

impl PolicyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_reviews(mut self, skip: bool) -> Self {
        self.skip_reviews = skip;
        self
    }

    /// Exempt the authors in a comma-delimited list (e.g. `"dependabot,renovate"`)
    pub fn skip_review_for(mut self, authors: &str) -> Self {
        self.skip_review_for_authors = authors
            .split(',')
            .filter(|login| !login.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    pub fn skip_test_plan(mut self, skip: bool) -> Self {
        self.skip_test_plan = skip;
        self
    }

    /// Set the protected branch; an empty name disables the check
    pub fn protected_branch(mut self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        self.protected_branch = (!branch.is_empty()).then_some(branch);
        self
    }

    /// Exact, case-sensitive match against the exemption list
    pub fn is_author_exempt(&self, login: &str) -> bool {
        self.skip_review_for_authors.iter().any(|author| author == login)
    }

    pub fn is_protected(&self, branch: &str) -> bool {
        self.protected_branch.as_deref() == Some(branch)
    }
}
