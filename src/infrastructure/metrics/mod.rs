//! Prometheus Metrics Module
//!
//! Provides client-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Backend API call counts by operation and outcome
//! - Backend API latency histograms
//! - Heartbeat outcomes
//! - Play sessions currently held by controllers

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// API call counter - tracks backend calls by operation and outcome
pub static API_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("api_requests_total", "Total number of backend API calls")
            .namespace("playtime_client"),
        &["operation", "outcome"],
    )
    .expect("Failed to create API_REQUESTS_TOTAL metric")
});

/// API latency histogram - tracks call duration in seconds
pub static API_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "api_request_duration_seconds",
            "Backend API call latency in seconds",
        )
        .namespace("playtime_client")
        .buckets(buckets),
        &["operation"],
    )
    .expect("Failed to create API_REQUEST_DURATION_SECONDS metric")
});

/// Heartbeat outcomes
pub static HEARTBEATS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("heartbeats_total", "Play session heartbeats by outcome")
            .namespace("playtime_client"),
        &["outcome"], // "ok", "rotated", "failed"
    )
    .expect("Failed to create HEARTBEATS_TOTAL metric")
});

/// Sessions currently playing (including suspended ones)
pub static PLAY_SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("play_sessions_active", "Play sessions currently held")
            .namespace("playtime_client"),
    )
    .expect("Failed to create PLAY_SESSIONS_ACTIVE metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(API_REQUESTS_TOTAL.clone()))
        .expect("Failed to register API_REQUESTS_TOTAL");
    registry
        .register(Box::new(API_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register API_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(HEARTBEATS_TOTAL.clone()))
        .expect("Failed to register HEARTBEATS_TOTAL");
    registry
        .register(Box::new(PLAY_SESSIONS_ACTIVE.clone()))
        .expect("Failed to register PLAY_SESSIONS_ACTIVE");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// Helper to record a backend API call
pub fn record_api_call(operation: &str, outcome: &str, duration_secs: f64) {
    API_REQUESTS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    API_REQUEST_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration_secs);
}

/// Helper to record a heartbeat outcome
pub fn record_heartbeat(outcome: &str) {
    HEARTBEATS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Helper to track sessions entering or leaving the playing state
pub fn session_attached() {
    PLAY_SESSIONS_ACTIVE.inc();
}

pub fn session_detached() {
    PLAY_SESSIONS_ACTIVE.dec();
}
