//! Tagged upstream error type
//!
//! Every failure the protocol client can report is one of these variants.
//! The pool matches on the variant to produce the user-facing message and
//! log severity — no runtime type inspection, no string sniffing outside
//! `classify.rs`.

/// Errors reported by the upstream social network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("invalid credentials")]
    Unauthorized,

    #[error("account suspended")]
    AccountSuspended,

    #[error("account locked")]
    AccountLocked,

    #[error("malformed request")]
    BadRequest,

    #[error("throttled by upstream")]
    TooManyRequests,

    #[error("upstream server failure")]
    ServerError,

    #[error("user not found")]
    UserNotFound,

    #[error("user unavailable")]
    UserUnavailable,

    #[error("tweet not available")]
    TweetNotAvailable,

    #[error("permission denied")]
    Forbidden,

    /// Anything the taxonomy does not recognize (transport failures,
    /// malformed payloads, unknown error codes).
    #[error("unexpected upstream failure: {0}")]
    Unexpected(String),
}
