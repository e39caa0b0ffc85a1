//! Fixed-window rate limiter, one instance per account session
//!
//! Each action key has an independent budget of `max_calls` per
//! `interval`. The window is realigned on demand: when an expired window
//! is first observed, it restarts relative to "now", not to a fixed epoch,
//! so windows drift after idle periods. This is not a strict rolling
//! window, and callers depend on the drift.
//!
//! Keys absent from the table are unlimited. `acquire` cannot fail, only
//! delay.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Budget for one action key: at most `max_calls` per `interval`.
#[derive(Debug, Clone, Copy)]
pub struct RateBudget {
    pub max_calls: u32,
    pub interval: Duration,
}

/// Immutable mapping from action key to budget, loaded once at startup.
pub type RateLimitTable = HashMap<String, RateBudget>;

#[derive(Debug)]
struct WindowState {
    budget: RateBudget,
    calls: u32,
    window_reset: Instant,
}

/// Per-session call budget tracker.
///
/// All window state lives behind one `tokio::sync::Mutex`, held across the
/// wait, so concurrent acquirers of the same limiter serialize. Limiters of
/// different sessions share nothing — a rate limit on one account can never
/// slow another.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, WindowState>>,
}

impl RateLimiter {
    /// Build a limiter from the configured table. Every configured key
    /// starts with a fresh window anchored at construction time.
    pub fn new(table: &RateLimitTable) -> Self {
        let now = Instant::now();
        let windows = table
            .iter()
            .map(|(key, budget)| {
                (
                    key.clone(),
                    WindowState {
                        budget: *budget,
                        calls: 0,
                        window_reset: now + budget.interval,
                    },
                )
            })
            .collect();
        Self {
            windows: Mutex::new(windows),
        }
    }

    /// Wait until a call slot is free for `action`, then consume it.
    ///
    /// Unconfigured actions return immediately (permissive default). After
    /// waiting out an exhausted window the limiter applies the reset it
    /// computed before sleeping, so `calls <= max_calls` holds whenever
    /// this returns.
    pub async fn acquire(&self, action: &str) {
        let mut windows = self.windows.lock().await;
        let Some(state) = windows.get_mut(action) else {
            return;
        };

        let now = Instant::now();
        if now >= state.window_reset {
            state.calls = 0;
            state.window_reset = now + state.budget.interval;
        }

        if state.calls >= state.budget.max_calls {
            let wait = state.window_reset - now;
            debug!(
                action,
                wait_secs = wait.as_secs_f64(),
                "rate budget exhausted, waiting for window"
            );
            metrics::counter!("rate_limiter_waits_total", "action" => action.to_string())
                .increment(1);
            // Lock stays held: later acquirers of this limiter queue behind
            // the wait instead of overdrawing the window.
            sleep(wait).await;
            state.calls = 0;
            state.window_reset = Instant::now() + state.budget.interval;
        }

        state.calls += 1;
    }
}
