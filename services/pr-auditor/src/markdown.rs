//! Markdown Section Parsing
//!
//! Helpers for pulling semantic sections out of a pull request description:
//! stripping HTML comments left behind by PR templates and splitting the body
//! on recognized dividers such as `### Test Plan` or `No review required:`.

use regex::Regex;
use std::sync::LazyLock;

// Compiled once, shared read-only across evaluations
static TEST_PLAN_DIVIDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(#+ Test [pP]lan)|(Test [pP]lan:)").unwrap());

static NO_REVIEW_REQUIRED_DIVIDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)([nN]o [rR]eview [rR]equired:)").unwrap());

static MARKDOWN_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("<!--((.|\n)*?)-->(\n)*").unwrap());

/// A recognized marker that starts a section of the PR body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divider {
    /// `# Test Plan` heading (any depth) or an inline `Test plan:` label
    TestPlan,
    /// Inline `No review required:` label followed by an explanation
    NoReviewRequired,
}

impl Divider {
    fn regex(self) -> &'static Regex {
        match self {
            Divider::TestPlan => &*TEST_PLAN_DIVIDER,
            Divider::NoReviewRequired => &*NO_REVIEW_REQUIRED_DIVIDER,
        }
    }

    /// Raw (uncleaned) text following the first occurrence of the divider.
    ///
    /// Returns `None` when the divider does not occur in `text`.
    pub fn section_after(self, text: &str) -> Option<&str> {
        let mut sections = split_sections(text, self, 2).into_iter();
        sections.next()?;
        sections.next()
    }
}

/// Split `text` on `divider` into at most `limit` pieces.
///
/// Only the first `limit - 1` matches act as split points; the last piece
/// keeps the remainder verbatim, further dividers included. Without a match
/// the whole text comes back as a single piece.
pub fn split_sections(text: &str, divider: Divider, limit: usize) -> Vec<&str> {
    divider.regex().splitn(text, limit).collect()
}

/// Strip HTML comments (and the newlines trailing them), then trim whitespace.
///
/// An unterminated `<!--` has no closing delimiter to match and is left alone.
pub fn clean_markdown(text: &str) -> String {
    MARKDOWN_COMMENT.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_markdown_strips_comments() {
        let text = "<!-- describe your change -->\n\nActual content\n";
        assert_eq!(clean_markdown(text), "Actual content");
    }

    #[test]
    fn test_clean_markdown_multiline_comment() {
        let text = "before\n<!--\nline one\nline two\n-->\n\nafter";
        assert_eq!(clean_markdown(text), "before\nafter");
    }

    #[test]
    fn test_clean_markdown_non_greedy() {
        let text = "<!-- a -->keep<!-- b -->";
        assert_eq!(clean_markdown(text), "keep");
    }

    #[test]
    fn test_clean_markdown_unterminated_comment() {
        let text = "  plan <!-- never closed\n";
        assert_eq!(clean_markdown(text), "plan <!-- never closed");
    }

    #[test]
    fn test_clean_markdown_total_on_blank_input() {
        assert_eq!(clean_markdown(""), "");
        assert_eq!(clean_markdown(" \n\t\n"), "");
    }

    #[test]
    fn test_clean_markdown_idempotent() {
        let inputs = [
            "",
            "plain",
            "<!-- x -->\n\n  text  \n",
            "a <!-- b\n c --> d <!-- open",
            "<!----><!-- -->\n\n\n",
        ];
        for input in inputs {
            let once = clean_markdown(input);
            assert_eq!(clean_markdown(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_split_heading_divider() {
        let sections = split_sections("Intro\n### Test Plan\nI have a plan!", Divider::TestPlan, 2);
        assert_eq!(sections, vec!["Intro\n", "\nI have a plan!"]);
    }

    #[test]
    fn test_split_inline_divider_lowercase_plan() {
        let sections = split_sections("Test plan: ran it locally", Divider::TestPlan, 2);
        assert_eq!(sections, vec!["", " ran it locally"]);
    }

    #[test]
    fn test_split_is_case_sensitive_on_first_word() {
        assert_eq!(Divider::TestPlan.section_after("## test plan\nnope"), None);
        assert_eq!(Divider::TestPlan.section_after("TEST PLAN: nope"), None);
    }

    #[test]
    fn test_split_without_match_returns_whole_text() {
        let sections = split_sections("no plan here", Divider::TestPlan, 2);
        assert_eq!(sections, vec!["no plan here"]);
    }

    #[test]
    fn test_split_only_on_first_match() {
        let text = "Test plan: one\nTest plan: two";
        let sections = split_sections(text, Divider::TestPlan, 2);
        assert_eq!(sections, vec!["", " one\nTest plan: two"]);
    }

    #[test]
    fn test_no_review_divider_variants() {
        for text in [
            "No review required: bot",
            "no Review Required: bot",
            "text then No review required: bot",
        ] {
            assert_eq!(
                Divider::NoReviewRequired.section_after(text),
                Some(" bot"),
                "text: {text:?}"
            );
        }
        assert_eq!(Divider::NoReviewRequired.section_after("No review needed"), None);
    }
}
