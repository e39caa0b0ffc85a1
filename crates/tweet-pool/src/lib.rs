//! Account pool for multiplexed tweet fetching
//!
//! Manages multiple authenticated upstream sessions, each with its own
//! fixed-window rate budget per action key, and schedules incoming fetch
//! requests onto the first eligible session.
//!
//! Request lifecycle:
//! 1. Gateway calls `Pool::get_user_tweets`
//! 2. Pool scans sessions in registration order under the selection lock
//!    and claims the first one that is logged in, idle, and not rate
//!    limited
//! 3. The claimed session waits out its rate budget for the action key,
//!    resolves the user, fetches a page, and shapes the tweets
//! 4. Upstream failures become `{success:false, error}` outcomes at the
//!    session boundary — nothing past it ever sees a raw upstream error
//! 5. If no session is eligible, the pool backs off and retries

pub mod outcome;
pub mod pool;
pub mod rate;
pub mod session;
pub mod shape;

pub use outcome::{FetchOutcome, Severity, TweetsData, describe};
pub use pool::{Pool, PoolConfig};
pub use rate::{RateBudget, RateLimitTable, RateLimiter};
pub use session::{AccountSession, TWEETS_PER_PAGE};
pub use shape::{Author, Engagement, MediaItem, Tweet, shape_tweet, shape_user};

#[cfg(test)]
pub(crate) mod testsource;
