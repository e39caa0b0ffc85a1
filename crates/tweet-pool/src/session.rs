//! One pooled account session
//!
//! A session owns an authenticated `TweetSource`, its own rate limiter, and
//! the three scheduling flags the pool reads: `logged_in`, `busy`, and
//! `rate_limited`. Claiming is a compare-and-swap on `busy`, so two
//! concurrent requests can never hold the same session.
//!
//! Every fetch ends in a `FetchOutcome`. Upstream errors are logged here at
//! their taxonomy severity and never propagate as `Err` past this module.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};
use upstream::{AccountCredentials, TweetSource, UpstreamError};

use crate::outcome::{FetchOutcome, Severity, TweetsData, describe};
use crate::rate::{RateLimitTable, RateLimiter};
use crate::shape::{ShapeError, shape_tweet};

/// Page size requested from the upstream on every fetch.
pub const TWEETS_PER_PAGE: u32 = 40;

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

pub struct AccountSession {
    label: String,
    credentials: AccountCredentials,
    source: Box<dyn TweetSource>,
    limiter: RateLimiter,
    logged_in: AtomicBool,
    busy: AtomicBool,
    rate_limited: AtomicBool,
}

/// Clears `busy` when the fetch finishes, on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AccountSession {
    pub fn new(
        credentials: AccountCredentials,
        source: Box<dyn TweetSource>,
        limits: &RateLimitTable,
    ) -> Self {
        Self {
            label: credentials.auth_info_1.clone(),
            credentials,
            source,
            limiter: RateLimiter::new(limits),
            logged_in: AtomicBool::new(false),
            busy: AtomicBool::new(false),
            rate_limited: AtomicBool::new(false),
        }
    }

    /// Account identifier used in logs and health output.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.rate_limited.load(Ordering::SeqCst)
    }

    /// Log in the session's account. A failed login is logged at its
    /// taxonomy severity and leaves the session out of the eligible set;
    /// it never aborts pool startup.
    pub async fn start(&self) {
        match self.source.login(&self.credentials).await {
            Ok(()) => {
                self.logged_in.store(true, Ordering::SeqCst);
                info!(account = %self.label, "logged in");
            }
            Err(err) => {
                let (message, severity) = describe(&err);
                match severity {
                    Severity::Warning => warn!(account = %self.label, "login failed: {message}"),
                    Severity::Error => error!(account = %self.label, "login failed: {message}"),
                }
            }
        }
    }

    /// Atomically claim the session for one fetch. Only logged-in,
    /// non-rate-limited, idle sessions are claimable.
    pub fn try_claim(&self) -> bool {
        if !self.is_logged_in() || self.is_rate_limited() {
            return false;
        }
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Claim-and-fetch in one call, for callers outside the pool's
    /// scheduling loop. The pool itself claims first and calls
    /// [`fetch_claimed`](Self::fetch_claimed).
    pub async fn fetch_user_tweets(
        &self,
        username: &str,
        tweet_type: &str,
        cursor: Option<&str>,
    ) -> FetchOutcome {
        if !self.try_claim() {
            return FetchOutcome::failure("Session is busy or rate limited");
        }
        self.fetch_claimed(username, tweet_type, cursor).await
    }

    /// Run one fetch on an already-claimed session. Releases the claim on
    /// return, success or failure.
    pub async fn fetch_claimed(
        &self,
        username: &str,
        tweet_type: &str,
        cursor: Option<&str>,
    ) -> FetchOutcome {
        let _guard = BusyGuard(&self.busy);

        match self.run_fetch(username, tweet_type, cursor).await {
            Ok(data) => {
                metrics::counter!("session_fetches_total", "account" => self.label.clone(), "result" => "success")
                    .increment(1);
                FetchOutcome::success(data)
            }
            Err(err) => {
                if matches!(err, FetchError::Upstream(UpstreamError::TooManyRequests)) {
                    self.rate_limited.store(true, Ordering::SeqCst);
                }
                metrics::counter!("session_fetches_total", "account" => self.label.clone(), "result" => "failure")
                    .increment(1);
                self.outcome_for(&err, username, tweet_type)
            }
        }
    }

    async fn run_fetch(
        &self,
        username: &str,
        tweet_type: &str,
        cursor: Option<&str>,
    ) -> Result<TweetsData, FetchError> {
        let action = format!("get_user_tweets[tweet_type={tweet_type}]");
        self.limiter.acquire(&action).await;

        let user = self.source.user_by_screen_name(username).await?;
        let page = self
            .source
            .user_tweets(&user.id, tweet_type, TWEETS_PER_PAGE, cursor)
            .await?;

        let tweets = page
            .items
            .iter()
            .map(shape_tweet)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TweetsData {
            previous: page.previous_cursor,
            tweets,
            next: page.next_cursor,
        })
    }

    fn outcome_for(&self, err: &FetchError, username: &str, tweet_type: &str) -> FetchOutcome {
        match err {
            FetchError::Upstream(upstream) => {
                let (message, severity) = describe(upstream);
                match severity {
                    Severity::Warning => warn!(
                        account = %self.label, username, tweet_type,
                        "fetch failed: {message}"
                    ),
                    Severity::Error => error!(
                        account = %self.label, username, tweet_type,
                        "fetch failed: {message}"
                    ),
                }
                FetchOutcome::failure(message)
            }
            FetchError::Shape(shape) => {
                error!(
                    account = %self.label, username, tweet_type,
                    "fetch failed: {shape}"
                );
                FetchOutcome::failure("Unexpected error occurred")
            }
        }
    }
}
