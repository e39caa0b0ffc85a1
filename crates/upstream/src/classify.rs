//! Upstream failure classification
//!
//! Maps a non-success sidecar response (HTTP status + body) onto the tagged
//! `UpstreamError` taxonomy. The sidecar reports structured errors as
//! `{"error":{"code":"...","message":"..."}}`; the code string is
//! authoritative, the status is the fallback for bodies without one.

use crate::error::UpstreamError;

/// Classify an error response by its body code, falling back to status.
pub fn classify_response(status: u16, body: &str) -> UpstreamError {
    if let Some(code) = error_code(body)
        && let Some(err) = from_code(&code)
    {
        return err;
    }
    from_status(status, body)
}

/// Extract `error.code` from a structured error body.
fn error_code(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("code")?
        .as_str()
        .map(str::to_owned)
}

fn from_code(code: &str) -> Option<UpstreamError> {
    match code {
        "unauthorized" => Some(UpstreamError::Unauthorized),
        "account_suspended" => Some(UpstreamError::AccountSuspended),
        "account_locked" => Some(UpstreamError::AccountLocked),
        "bad_request" => Some(UpstreamError::BadRequest),
        "rate_limit_exceeded" => Some(UpstreamError::TooManyRequests),
        "server_error" => Some(UpstreamError::ServerError),
        "user_not_found" => Some(UpstreamError::UserNotFound),
        "user_unavailable" => Some(UpstreamError::UserUnavailable),
        "tweet_not_available" => Some(UpstreamError::TweetNotAvailable),
        "forbidden" => Some(UpstreamError::Forbidden),
        _ => None,
    }
}

fn from_status(status: u16, body: &str) -> UpstreamError {
    match status {
        400 => UpstreamError::BadRequest,
        401 => UpstreamError::Unauthorized,
        403 => UpstreamError::Forbidden,
        404 => UpstreamError::UserNotFound,
        429 => UpstreamError::TooManyRequests,
        500 | 502 | 503 | 504 => UpstreamError::ServerError,
        _ => UpstreamError::Unexpected(format!("status {status}: {body}")),
    }
}
