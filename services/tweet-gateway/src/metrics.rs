//! Prometheus metrics exposition
//!
//! Gateway-level metrics:
//!
//! - `gateway_requests_total` (counter): labels `tweet_type`, `result`
//! - `gateway_request_duration_seconds` (histogram): label `result`
//!
//! The pool and rate limiter record their own counters
//! (`pool_wait_cycles_total`, `rate_limiter_waits_total`,
//! `session_fetches_total`) through the same recorder.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
///
/// Configures `gateway_request_duration_seconds` with explicit buckets so it
/// renders as a histogram with `_bucket` lines. The upper buckets are wide
/// because a request can sit in the pool's backoff loop or wait out a rate
/// window before its fetch even starts.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(
                "gateway_request_duration_seconds".to_string(),
            ),
            &[
                0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0,
            ],
        )
        .expect("failed to set histogram buckets")
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Record a completed tweets request.
pub fn record_request(tweet_type: &str, result: &str, duration_secs: f64) {
    metrics::counter!("gateway_requests_total", "tweet_type" => tweet_type.to_string(), "result" => result.to_string())
        .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "result" => result.to_string())
        .record(duration_secs);
}
