//! Test Plan Extraction

use crate::markdown::{clean_markdown, Divider};

/// Extract the test plan from a PR description.
///
/// Returns `None` when the body has no test plan divider at all. When the
/// divider is present, everything after it is cleaned and returned, even if
/// that leaves an empty string.
pub fn extract_test_plan(body: &str) -> Option<String> {
    Divider::TestPlan.section_after(body).map(clean_markdown)
}
