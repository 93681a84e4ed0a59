//! Audit Errors

use thiserror::Error;

/// Failure while asking the review system whether a PR was approved.
///
/// "No reviews found" is not an error; these variants only cover cases where
/// the answer is unknown.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// Request never produced a response (DNS, TLS, timeout, ...)
    #[error("Request failed: {0}")]
    Transport(String),

    /// GitHub answered with a non-success status
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("Failed to parse reviews response: {0}")]
    Decode(String),

    /// Credentials could not be obtained
    #[error("Authentication failed: {0}")]
    Authentication(String),
}

impl From<reqwest::Error> for ApprovalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApprovalError::Decode(err.to_string())
        } else {
            ApprovalError::Transport(err.to_string())
        }
    }
}

/// Unrecoverable condition hit during an evaluation
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// Approval state is unknown; review was treated as unsatisfied
    #[error("Approval lookup failed: {0}")]
    Approval(#[from] ApprovalError),
}
