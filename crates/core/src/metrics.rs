//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Response cache (hits, misses, expiries, persistence failures)
//! - Outbound catalog requests and the rate limiter queue
//! - Mock catalog fallbacks
//! - AI assistant completions

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bytebooks_cache_lookups_total", "Response cache lookups"),
        &["result"], // "hit", "miss", "expired"
    )
    .unwrap()
});

/// Failed attempts to persist local state.
pub static PERSIST_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bytebooks_persist_failures_total",
            "Failed writes to the durable local store",
        ),
        &["record"],
    )
    .unwrap()
});

// =============================================================================
// Catalog Metrics
// =============================================================================

/// Outbound catalog request duration.
pub static SOURCE_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "bytebooks_source_request_duration_seconds",
            "Duration of outbound catalog requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["source", "operation"],
    )
    .unwrap()
});

/// Outbound catalog requests total.
pub static SOURCE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bytebooks_source_requests_total",
            "Total outbound catalog requests",
        ),
        &["source", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Tasks waiting in the outbound rate limiter queue.
pub static RATE_LIMITER_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "bytebooks_rate_limiter_queued",
        "Tasks waiting in the outbound rate limiter queue",
    )
    .unwrap()
});

/// Responses served by the mock catalog instead of the live source.
pub static CATALOG_FALLBACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bytebooks_catalog_fallbacks_total",
            "Catalog responses served from mock data",
        ),
        &["operation", "reason"], // reason: "error", "empty", "disabled"
    )
    .unwrap()
});

// =============================================================================
// Assistant Metrics
// =============================================================================

/// Assistant answers by origin.
pub static ASSISTANT_REPLIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bytebooks_assistant_replies_total", "AI assistant replies"),
        &["operation", "origin"], // origin: "model", "canned"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(PERSIST_FAILURES.clone()),
        Box::new(SOURCE_REQUEST_DURATION.clone()),
        Box::new(SOURCE_REQUESTS.clone()),
        Box::new(RATE_LIMITER_QUEUED.clone()),
        Box::new(CATALOG_FALLBACKS.clone()),
        Box::new(ASSISTANT_REPLIES.clone()),
    ]
}
