//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Account passwords live in the TOML accounts list; they deserialize into
//! `common::Secret` so nothing downstream can log them.

use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tweet_pool::{PoolConfig, RateBudget, RateLimitTable};
use upstream::AccountCredentials;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub pool: PoolSettings,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub accounts: Vec<AccountCredentials>,
    /// Rate budgets keyed by action, e.g.
    /// `"get_user_tweets[tweet_type=Tweets]" = [1, 60]`.
    #[serde(default)]
    pub limits: HashMap<String, RateEntry>,
}

/// `[max_calls, window_secs]` pair from the limits table.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateEntry(pub u32, pub u64);

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct GatewayConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Hard deadline for one request, pool wait included. Unset means a
    /// request waits as long as the pool keeps polling.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Session scheduling settings
#[derive(Debug, Deserialize)]
pub struct PoolSettings {
    #[serde(default = "default_backoff")]
    pub backoff_secs: u64,
    /// Poll attempts before a request gives up; unset polls forever.
    #[serde(default)]
    pub max_wait_cycles: Option<u32>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            backoff_secs: default_backoff(),
            max_wait_cycles: None,
        }
    }
}

/// Scraper sidecar settings
#[derive(Debug, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

fn default_max_connections() -> usize {
    1000
}

fn default_backoff() -> u64 {
    5
}

fn default_upstream_timeout() -> u64 {
    30
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        if !config.upstream.base_url.starts_with("http://")
            && !config.upstream.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "upstream base_url must start with http:// or https://, got: {}",
                config.upstream.base_url
            )));
        }

        if config.upstream.timeout_secs == 0 {
            return Err(common::Error::Config(
                "upstream timeout_secs must be greater than 0".into(),
            ));
        }

        if config.gateway.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if config.gateway.request_timeout_secs == Some(0) {
            return Err(common::Error::Config(
                "request_timeout_secs must be greater than 0 when set".into(),
            ));
        }

        if config.pool.backoff_secs == 0 {
            return Err(common::Error::Config(
                "pool backoff_secs must be greater than 0".into(),
            ));
        }

        for (action, RateEntry(max_calls, secs)) in &config.limits {
            if *max_calls == 0 || *secs == 0 {
                return Err(common::Error::Config(format!(
                    "limit for {action:?} must have non-zero calls and window"
                )));
            }
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("tweet-gateway.toml")
    }

    pub fn rate_table(&self) -> RateLimitTable {
        self.limits
            .iter()
            .map(|(action, RateEntry(max_calls, secs))| {
                (
                    action.clone(),
                    RateBudget {
                        max_calls: *max_calls,
                        interval: Duration::from_secs(*secs),
                    },
                )
            })
            .collect()
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            backoff: Duration::from_secs(self.pool.backoff_secs),
            max_wait_cycles: self.pool.max_wait_cycles,
        }
    }
}
