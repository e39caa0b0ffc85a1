//! In-memory `TweetSource` for session and pool tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use upstream::{AccountCredentials, Result, TweetPage, TweetSource, UpstreamError, UserProfile};

/// Scripted upstream: each operation either succeeds with canned data or
/// fails with a preset error. Counters record how often each operation ran.
pub(crate) struct StubSource {
    pub login_error: Option<UpstreamError>,
    pub resolve_error: Option<UpstreamError>,
    pub fetch_error: Option<UpstreamError>,
    /// Virtual-time delay applied inside `user_tweets`, to keep a session
    /// busy long enough for scheduling tests to observe it.
    pub fetch_delay: Duration,
    pub profile: UserProfile,
    pub page: TweetPage,
    pub logins: AtomicUsize,
    pub resolves: AtomicUsize,
    pub fetches: AtomicUsize,
    /// Cursor passed to the most recent fetch.
    pub last_cursor: Mutex<Option<String>>,
}

pub(crate) fn stub_profile(screen_name: &str) -> UserProfile {
    serde_json::from_value(serde_json::json!({
        "id": "12",
        "screen_name": screen_name,
        "name": screen_name,
        "created_at": "Tue Mar 21 20:50:14 +0000 2006",
    }))
    .unwrap()
}

pub(crate) fn stub_page(tweet_ids: &[&str]) -> TweetPage {
    let items: Vec<serde_json::Value> = tweet_ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "created_at": "Tue Mar 21 20:50:14 +0000 2006",
                "text": format!("tweet {id}"),
                "user": serde_json::to_value(stub_profile("jack")).unwrap(),
            })
        })
        .collect();
    serde_json::from_value(serde_json::json!({
        "items": items,
        "previous_cursor": "cur-prev",
        "next_cursor": "cur-next",
    }))
    .unwrap()
}

impl Default for StubSource {
    fn default() -> Self {
        Self {
            login_error: None,
            resolve_error: None,
            fetch_error: None,
            fetch_delay: Duration::ZERO,
            profile: stub_profile("jack"),
            page: stub_page(&["20"]),
            logins: AtomicUsize::new(0),
            resolves: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            last_cursor: Mutex::new(None),
        }
    }
}

impl StubSource {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn with_fetch_error(error: UpstreamError) -> Arc<Self> {
        Arc::new(Self {
            fetch_error: Some(error),
            ..Self::default()
        })
    }

    pub(crate) fn with_resolve_error(error: UpstreamError) -> Arc<Self> {
        Arc::new(Self {
            resolve_error: Some(error),
            ..Self::default()
        })
    }

    pub(crate) fn with_login_error(error: UpstreamError) -> Arc<Self> {
        Arc::new(Self {
            login_error: Some(error),
            ..Self::default()
        })
    }

    pub(crate) fn with_fetch_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            fetch_delay: delay,
            ..Self::default()
        })
    }
}

/// Newtype handing a shared source to a session as a `Box<dyn TweetSource>`
/// while the test keeps its own `Arc` handle (a foreign trait cannot be
/// implemented for `Arc<T>` directly).
pub(crate) struct Shared<T>(pub(crate) Arc<T>);

impl<T: TweetSource> TweetSource for Shared<T> {
    fn login<'a>(
        &'a self,
        credentials: &'a AccountCredentials,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        self.0.login(credentials)
    }

    fn user_by_screen_name<'a>(
        &'a self,
        username: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<UserProfile>> + Send + 'a>> {
        self.0.user_by_screen_name(username)
    }

    fn user_tweets<'a>(
        &'a self,
        user_id: &'a str,
        tweet_type: &'a str,
        count: u32,
        cursor: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<TweetPage>> + Send + 'a>> {
        self.0.user_tweets(user_id, tweet_type, count, cursor)
    }
}

impl TweetSource for StubSource {
    fn login<'a>(
        &'a self,
        _credentials: &'a AccountCredentials,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.logins.fetch_add(1, Ordering::SeqCst);
            match &self.login_error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        })
    }

    fn user_by_screen_name<'a>(
        &'a self,
        _username: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<UserProfile>> + Send + 'a>> {
        Box::pin(async move {
            self.resolves.fetch_add(1, Ordering::SeqCst);
            match &self.resolve_error {
                Some(err) => Err(err.clone()),
                None => Ok(self.profile.clone()),
            }
        })
    }

    fn user_tweets<'a>(
        &'a self,
        _user_id: &'a str,
        _tweet_type: &'a str,
        _count: u32,
        cursor: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<TweetPage>> + Send + 'a>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            *self.last_cursor.lock().await = cursor.map(str::to_string);
            if self.fetch_delay > Duration::ZERO {
                tokio::time::sleep(self.fetch_delay).await;
            }
            match &self.fetch_error {
                Some(err) => Err(err.clone()),
                None => Ok(self.page.clone()),
            }
        })
    }
}
