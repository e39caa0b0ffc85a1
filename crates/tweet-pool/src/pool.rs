//! Session scheduling
//!
//! The pool scans sessions in registration order under one selection lock
//! and claims the first eligible session, then dispatches the fetch with
//! the lock already released — a slow upstream call on one session never
//! blocks selection for other requests. When every session is busy or
//! parked, the request backs off and polls again.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::outcome::FetchOutcome;
use crate::session::AccountSession;

const NO_SESSION_AVAILABLE: &str = "No session available. Try again later.";

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Delay between polls when no session is claimable.
    pub backoff: Duration,
    /// Poll attempts before giving up; `None` waits indefinitely.
    pub max_wait_cycles: Option<u32>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(5),
            max_wait_cycles: None,
        }
    }
}

pub struct Pool {
    sessions: Vec<Arc<AccountSession>>,
    // Serializes the scan-and-claim step only; fetches run outside it.
    selection: Mutex<()>,
    config: PoolConfig,
}

impl Pool {
    pub fn new(sessions: Vec<AccountSession>, config: PoolConfig) -> Self {
        Self {
            sessions: sessions.into_iter().map(Arc::new).collect(),
            selection: Mutex::new(()),
            config,
        }
    }

    pub fn sessions(&self) -> &[Arc<AccountSession>] {
        &self.sessions
    }

    /// Log in every session concurrently. Individual login failures are
    /// logged by the session and leave it out of the eligible set; startup
    /// itself always completes.
    pub async fn start_all(&self) {
        let mut set = JoinSet::new();
        for session in &self.sessions {
            let session = session.clone();
            set.spawn(async move { session.start().await });
        }
        while set.join_next().await.is_some() {}

        let logged_in = self.sessions.iter().filter(|s| s.is_logged_in()).count();
        info!(
            total = self.sessions.len(),
            logged_in, "session startup complete"
        );
    }

    /// Fetch one page of tweets on the first available session.
    ///
    /// Waits (poll plus backoff) while every session is busy or parked.
    /// With `max_wait_cycles` unset this never gives up; a bounded pool
    /// returns the no-session failure outcome once the budget is spent.
    pub async fn get_user_tweets(
        &self,
        username: &str,
        tweet_type: &str,
        cursor: Option<&str>,
    ) -> FetchOutcome {
        if self.sessions.is_empty() {
            warn!(username, tweet_type, "no sessions configured");
            return FetchOutcome::failure(NO_SESSION_AVAILABLE);
        }

        let mut cycles: u32 = 0;
        loop {
            let claimed = {
                let _select = self.selection.lock().await;
                self.sessions.iter().find(|s| s.try_claim()).cloned()
            };

            if let Some(session) = claimed {
                debug!(account = %session.label(), username, tweet_type, "dispatching fetch");
                return session.fetch_claimed(username, tweet_type, cursor).await;
            }

            cycles += 1;
            metrics::counter!("pool_wait_cycles_total").increment(1);
            if let Some(max) = self.config.max_wait_cycles
                && cycles >= max
            {
                warn!(username, tweet_type, cycles, "no session became available");
                return FetchOutcome::failure(NO_SESSION_AVAILABLE);
            }
            debug!(username, tweet_type, cycles, "all sessions busy, backing off");
            sleep(self.config.backoff).await;
        }
    }

    /// Pool health snapshot: overall status plus one entry per session.
    ///
    /// `healthy` means every session can take work, `degraded` means some
    /// can, `unhealthy` means none can. Busy sessions still count as able.
    pub fn health(&self) -> serde_json::Value {
        let sessions: Vec<_> = self
            .sessions
            .iter()
            .map(|s| {
                let state = if !s.is_logged_in() {
                    "logged_out"
                } else if s.is_rate_limited() {
                    "rate_limited"
                } else if s.is_busy() {
                    "busy"
                } else {
                    "idle"
                };
                json!({ "account": s.label(), "state": state })
            })
            .collect();

        let able = self
            .sessions
            .iter()
            .filter(|s| s.is_logged_in() && !s.is_rate_limited())
            .count();
        let status = if able == self.sessions.len() && able > 0 {
            "healthy"
        } else if able > 0 {
            "degraded"
        } else {
            "unhealthy"
        };

        json!({
            "status": status,
            "sessions_total": self.sessions.len(),
            "sessions_available": able,
            "sessions": sessions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::RateLimitTable;
    use crate::testsource::{Shared, StubSource, stub_page, stub_profile};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;
    use upstream::{
        AccountCredentials, Result as UpstreamResult, TweetPage, TweetSource, UpstreamError,
        UserProfile,
    };

    fn credentials(label: &str) -> AccountCredentials {
        toml::from_str(&format!(
            "auth_info_1 = \"{label}\"\npassword = \"pw\"\n"
        ))
        .unwrap()
    }

    fn session(label: &str, source: Arc<StubSource>) -> AccountSession {
        AccountSession::new(credentials(label), Box::new(Shared(source)), &RateLimitTable::new())
    }

    async fn started(pool: Pool) -> Arc<Pool> {
        pool.start_all().await;
        Arc::new(pool)
    }

    #[tokio::test(start_paused = true)]
    async fn requests_spread_across_idle_sessions() {
        let s1 = StubSource::with_fetch_delay(Duration::from_secs(2));
        let s2 = StubSource::with_fetch_delay(Duration::from_secs(2));
        let pool = started(Pool::new(
            vec![
                session("acct-1", s1.clone()),
                session("acct-2", s2.clone()),
            ],
            PoolConfig::default(),
        ))
        .await;

        let mut handles = Vec::new();
        for _ in 0..2 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                pool.get_user_tweets("jack", "Tweets", None).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_success());
        }

        assert_eq!(s1.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(s2.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn saturated_pool_backs_off_and_retries() {
        let source = StubSource::with_fetch_delay(Duration::from_secs(2));
        let pool = started(Pool::new(
            vec![session("acct-1", source.clone())],
            PoolConfig::default(),
        ))
        .await;

        let t0 = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..2 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                let outcome = pool.get_user_tweets("jack", "Tweets", None).await;
                (outcome, Instant::now())
            }));
        }

        let mut finished = Vec::new();
        for handle in handles {
            let (outcome, at) = handle.await.unwrap();
            assert!(outcome.is_success());
            finished.push(at);
        }
        finished.sort();

        // First request holds the only session for 2s; the second polls at
        // 5s and then runs its own 2s fetch.
        assert_eq!(finished[0] - t0, Duration::from_secs(2));
        assert_eq!(finished[1] - t0, Duration::from_secs(7));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn logged_out_sessions_never_take_work() {
        let bad = StubSource::with_login_error(UpstreamError::AccountLocked);
        let good = StubSource::shared();
        let pool = started(Pool::new(
            vec![
                session("acct-bad", bad.clone()),
                session("acct-good", good.clone()),
            ],
            PoolConfig::default(),
        ))
        .await;

        let outcome = pool.get_user_tweets("jack", "Tweets", None).await;
        assert!(outcome.is_success());
        assert_eq!(bad.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(good.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_pool_fails_without_waiting() {
        let pool = Pool::new(Vec::new(), PoolConfig::default());
        let t0 = Instant::now();
        let outcome = pool.get_user_tweets("jack", "Tweets", None).await;
        assert_eq!(
            outcome.error_message(),
            Some("No session available. Try again later.")
        );
        assert_eq!(Instant::now() - t0, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_pool_gives_up_after_the_cycle_budget() {
        let source = StubSource::shared();
        let pool = started(Pool::new(
            vec![session("acct-1", source)],
            PoolConfig {
                backoff: Duration::from_secs(5),
                max_wait_cycles: Some(2),
            },
        ))
        .await;

        // Park the only session so every poll comes up empty.
        assert!(pool.sessions()[0].try_claim());

        let t0 = Instant::now();
        let outcome = pool.get_user_tweets("jack", "Tweets", None).await;
        assert_eq!(
            outcome.error_message(),
            Some("No session available. Try again later.")
        );
        assert_eq!(Instant::now() - t0, Duration::from_secs(5));
    }

    /// Upstream that records how many fetches overlap in time.
    struct OverlapSource {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl OverlapSource {
        fn shared() -> Arc<Self> {
            Arc::new(Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }
    }

    impl TweetSource for OverlapSource {
        fn login<'a>(
            &'a self,
            _credentials: &'a AccountCredentials,
        ) -> Pin<Box<dyn Future<Output = UpstreamResult<()>> + Send + 'a>> {
            Box::pin(async move { Ok(()) })
        }

        fn user_by_screen_name<'a>(
            &'a self,
            _username: &'a str,
        ) -> Pin<Box<dyn Future<Output = UpstreamResult<UserProfile>> + Send + 'a>> {
            Box::pin(async move { Ok(stub_profile("jack")) })
        }

        fn user_tweets<'a>(
            &'a self,
            _user_id: &'a str,
            _tweet_type: &'a str,
            _count: u32,
            _cursor: Option<&'a str>,
        ) -> Pin<Box<dyn Future<Output = UpstreamResult<TweetPage>> + Send + 'a>> {
            Box::pin(async move {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(1)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(stub_page(&["20"]))
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn a_session_is_never_claimed_twice() {
        let source = OverlapSource::shared();
        let pool = started(Pool::new(
            vec![AccountSession::new(
                credentials("acct-1"),
                Box::new(Shared(source.clone())),
                &RateLimitTable::new(),
            )],
            PoolConfig {
                backoff: Duration::from_millis(100),
                max_wait_cycles: None,
            },
        ))
        .await;

        let mut handles = Vec::new();
        for _ in 0..5 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                pool.get_user_tweets("jack", "Tweets", None).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_success());
        }
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn health_reflects_per_session_state() {
        let good = StubSource::shared();
        let bad = StubSource::with_login_error(UpstreamError::Unauthorized);
        let throttled = StubSource::with_fetch_error(UpstreamError::TooManyRequests);
        let pool = started(Pool::new(
            vec![
                session("acct-good", good),
                session("acct-bad", bad),
                session("acct-throttled", throttled),
            ],
            PoolConfig::default(),
        ))
        .await;

        // Trip the rate-limited flag on the third session.
        pool.sessions()[2]
            .fetch_user_tweets("jack", "Tweets", None)
            .await;

        let health = pool.health();
        assert_eq!(health["status"], "degraded");
        assert_eq!(health["sessions_total"], 3);
        assert_eq!(health["sessions_available"], 1);
        assert_eq!(health["sessions"][0]["state"], "idle");
        assert_eq!(health["sessions"][1]["state"], "logged_out");
        assert_eq!(health["sessions"][2]["state"], "rate_limited");

        let empty = Pool::new(Vec::new(), PoolConfig::default());
        assert_eq!(empty.health()["status"], "unhealthy");
    }
}
