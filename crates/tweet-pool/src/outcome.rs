//! Fetch outcomes and the upstream error taxonomy
//!
//! Every request produces a `FetchOutcome` value — success with a page of
//! shaped tweets, or failure with one of the fixed taxonomy messages.
//! Errors never cross the session boundary as Rust errors; callers branch
//! on `success`, not on `Result`.

use serde::Serialize;
use upstream::UpstreamError;

use crate::shape::Tweet;

/// Log severity for a mapped upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Map an upstream error to its user-facing message and log severity.
///
/// The messages are fixed strings — the HTTP surface never exposes raw
/// upstream error text. Anything the taxonomy doesn't recognize becomes
/// the generic unexpected-error message.
pub fn describe(error: &UpstreamError) -> (&'static str, Severity) {
    match error {
        UpstreamError::Unauthorized => ("Unauthorized: Invalid credentials", Severity::Error),
        UpstreamError::AccountSuspended => {
            ("Account suspended. Login not possible.", Severity::Error)
        }
        UpstreamError::AccountLocked => {
            ("Account locked. Requires manual action.", Severity::Error)
        }
        UpstreamError::BadRequest => ("Bad Request: Invalid parameters.", Severity::Error),
        UpstreamError::TooManyRequests => {
            ("Rate limit exceeded. Try again later.", Severity::Warning)
        }
        UpstreamError::ServerError => {
            ("Twitter server error. Try again later.", Severity::Error)
        }
        UpstreamError::UserNotFound => ("User not found.", Severity::Warning),
        UpstreamError::UserUnavailable => ("User unavailable.", Severity::Warning),
        UpstreamError::TweetNotAvailable => ("Tweet not available.", Severity::Warning),
        UpstreamError::Forbidden => {
            ("Access denied. You may not have permission.", Severity::Error)
        }
        UpstreamError::Unexpected(_) => ("Unexpected error occurred", Severity::Error),
    }
}

/// Successful page payload. Cursors pass through from the upstream page
/// response unchanged.
#[derive(Debug, Clone, Serialize)]
pub struct TweetsData {
    pub previous: Option<String>,
    pub tweets: Vec<Tweet>,
    pub next: Option<String>,
}

/// What a fetch returns, in either direction.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FetchOutcome {
    Success { success: bool, data: TweetsData },
    Failure { success: bool, error: String },
}

impl FetchOutcome {
    pub fn success(data: TweetsData) -> Self {
        Self::Success {
            success: true,
            data,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            success: false,
            error: error.into(),
        }
    }

    pub fn from_upstream(error: &UpstreamError) -> Self {
        Self::failure(describe(error).0)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The failure message, if this is a failure.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failure { error, .. } => Some(error),
            Self::Success { .. } => None,
        }
    }
}
