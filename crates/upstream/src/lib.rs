//! Upstream social-network capability
//!
//! Models the protocol client (login, user lookup, tweet pagination) as an
//! opaque capability behind the `TweetSource` trait. The pool never sees
//! HTTP details — it sees three operations that either succeed or fail with
//! a tagged `UpstreamError`. `RestTweetSource` is the concrete
//! implementation talking to a scraper sidecar over JSON REST; tests swap
//! in in-memory sources.

pub mod classify;
pub mod credentials;
pub mod error;
pub mod rest;
pub mod types;

pub use classify::classify_response;
pub use credentials::AccountCredentials;
pub use error::UpstreamError;
pub use rest::RestTweetSource;
pub use types::{EditControl, RawMedia, RawTweet, TweetPage, UserProfile};

use std::future::Future;
use std::pin::Pin;

/// Result alias for upstream operations.
pub type Result<T> = std::result::Result<T, UpstreamError>;

/// One authenticated connection to the upstream social network.
///
/// Each pool session owns exactly one `TweetSource`. Implementations carry
/// whatever connection state the protocol needs (cookies, proxy, transport);
/// the pool only drives these three operations.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Box<dyn TweetSource>` per session).
pub trait TweetSource: Send + Sync {
    /// Establish the session using the stored account credentials.
    fn login<'a>(
        &'a self,
        credentials: &'a AccountCredentials,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Resolve a user by screen name.
    fn user_by_screen_name<'a>(
        &'a self,
        username: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<UserProfile>> + Send + 'a>>;

    /// Fetch one page of a user's tweets.
    ///
    /// `tweet_type` selects the timeline variant (e.g. "Tweets", "Replies",
    /// "Media"); `cursor` is the opaque pagination token from a previous
    /// page, passed back verbatim.
    fn user_tweets<'a>(
        &'a self,
        user_id: &'a str,
        tweet_type: &'a str,
        count: u32,
        cursor: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<TweetPage>> + Send + 'a>>;
}
