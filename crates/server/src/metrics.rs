//! Prometheus metrics for the HTTP layer.
//!
//! The registry also carries every core metric (cache, catalog sources,
//! fallbacks, assistant), so `/metrics` exposes the whole process.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::{Captures, Regex};

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "bytebooks_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bytebooks_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "bytebooks_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Rejected logins and registrations.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bytebooks_auth_failures_total",
            "Total rejected logins and registrations",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Storefront State (collected dynamically)
// =============================================================================

/// Units in the cart.
pub static CART_ITEMS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("bytebooks_cart_items", "Number of units in the cart").unwrap()
});

/// Entries in the response cache, including expired ones not yet evicted.
pub static CACHE_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "bytebooks_cache_entries",
        "Number of entries in the response cache",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Storefront
    registry.register(Box::new(CART_ITEMS.clone())).unwrap();
    registry.register(Box::new(CACHE_ENTRIES.clone())).unwrap();

    // Core metrics (cache, sources, fallbacks, assistant)
    for metric in bytebooks_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Refresh gauges from current application state before encoding.
pub fn collect_dynamic_metrics(state: &AppState) {
    CART_ITEMS.set(i64::try_from(state.cart().total_items()).unwrap_or(i64::MAX));
    CACHE_ENTRIES.set(i64::try_from(state.catalog().cache().len()).unwrap_or(i64::MAX));
}

static BOOK_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"/books/(.+)$").unwrap());
static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace ids, keys and categories with placeholders).
///
/// Everything after `/books/` other than `search` collapses to a placeholder,
/// so caller-chosen keys never become label values.
pub fn normalize_path(path: &str) -> String {
    let result = BOOK_TAIL.replace(path, |caps: &Captures| match &caps[1] {
        "search" => "/books/search",
        tail if tail.starts_with("category/") => "/books/category/{category}",
        tail if tail.bytes().all(|b| b.is_ascii_digit()) => "/books/{id}",
        _ => "/books/{key}",
    });
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}
