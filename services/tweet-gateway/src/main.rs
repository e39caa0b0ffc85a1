//! Tweet Gateway
//!
//! Single-binary HTTP service that:
//! 1. Logs a pool of upstream accounts in at startup
//! 2. Serves `GET /tweets/{username}/{tweet_type}` by scheduling each
//!    request onto the first available account session
//! 3. Holds every account inside its configured rate budgets
//! 4. Exposes `/health` and `/metrics` for operators

mod config;
mod metrics;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metrics_exporter_prometheus::PrometheusHandle;
use tweet_pool::{AccountSession, Pool};
use upstream::RestTweetSource;

use crate::config::Config;

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    pool: Arc<Pool>,
    prometheus: PrometheusHandle,
    request_timeout: Option<Duration>,
}

/// Build the axum router with all routes and shared state.
///
/// The concurrency limit layer caps in-flight requests; excess requests
/// queue rather than erroring.
fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/tweets/{username}/{tweet_type}", get(tweets_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting tweet-gateway");

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle = metrics::install_recorder();

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.gateway.listen_addr,
        upstream = %config.upstream.base_url,
        accounts = config.accounts.len(),
        limits = config.limits.len(),
        "configuration loaded"
    );

    if config.accounts.is_empty() {
        warn!("no accounts configured, every request will fail");
    }

    let rate_table = config.rate_table();
    let upstream_timeout = Duration::from_secs(config.upstream.timeout_secs);
    let mut sessions = Vec::with_capacity(config.accounts.len());
    for account in config.accounts.iter().cloned() {
        let source = RestTweetSource::new(
            &config.upstream.base_url,
            upstream_timeout,
            account.proxy.as_deref(),
        )
        .map_err(|e| anyhow::anyhow!("building client for {}: {e}", account.auth_info_1))?;
        sessions.push(AccountSession::new(account, Box::new(source), &rate_table));
    }

    let pool = Arc::new(Pool::new(sessions, config.pool_config()));
    pool.start_all().await;

    let state = AppState {
        pool,
        prometheus: prometheus_handle,
        request_timeout: config.gateway.request_timeout_secs.map(Duration::from_secs),
    };

    let app = build_router(state, config.gateway.max_connections);

    let listener = TcpListener::bind(config.gateway.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.gateway.listen_addr))?;

    info!(addr = %config.gateway.listen_addr, "accepting requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

#[derive(Deserialize)]
struct CursorQuery {
    cursor: Option<String>,
}

/// Tweets endpoint. Always 200 with a `FetchOutcome` body, except when the
/// request deadline expires before the pool produces one — that is the one
/// internal failure, served as `500 {"detail": "Internal Server Error"}`.
async fn tweets_handler(
    State(state): State<AppState>,
    Path((username, tweet_type)): Path<(String, String)>,
    Query(query): Query<CursorQuery>,
) -> Response {
    let started = std::time::Instant::now();
    let fetch = state
        .pool
        .get_user_tweets(&username, &tweet_type, query.cursor.as_deref());

    let outcome = match state.request_timeout {
        Some(deadline) => match tokio::time::timeout(deadline, fetch).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(username, tweet_type, "request deadline exceeded");
                metrics::record_request(&tweet_type, "timeout", started.elapsed().as_secs_f64());
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(serde_json::json!({"detail": "Internal Server Error"})),
                )
                    .into_response();
            }
        },
        None => fetch.await,
    };

    let result = if outcome.is_success() { "success" } else { "failure" };
    metrics::record_request(&tweet_type, result, started.elapsed().as_secs_f64());
    axum::Json(outcome).into_response()
}

/// Health endpoint: pool status plus one entry per session. 200 while at
/// least one session can take work, 503 otherwise.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.pool.health();
    let status_code = if health["status"] == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status_code, axum::Json(health))
}

/// Prometheus metrics endpoint — returns metrics in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
