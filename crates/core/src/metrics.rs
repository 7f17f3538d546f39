//! Prometheus metrics for the catalog client.
//!
//! This module provides metrics for:
//! - TTL caches (lookups, invalidations)
//! - Gateway (requests, latency)
//! - Collection store (superseded responses)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache lookups by cache name and result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bookshelf_cache_lookups_total", "Total cache lookups"),
        &["cache", "result"], // result: "hit", "miss"
    )
    .unwrap()
});

/// Cache invalidations by cache name.
pub static CACHE_INVALIDATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bookshelf_cache_invalidations_total",
            "Total cache entries invalidated",
        ),
        &["cache"],
    )
    .unwrap()
});

// =============================================================================
// Gateway Metrics
// =============================================================================

/// Gateway requests by endpoint and outcome.
pub static GATEWAY_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bookshelf_gateway_requests_total",
            "Total requests sent to the catalog API",
        ),
        &["endpoint", "outcome"], // outcome: "success", "error"
    )
    .unwrap()
});

/// Gateway request duration in seconds.
pub static GATEWAY_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "bookshelf_gateway_request_duration_seconds",
            "Duration of catalog API requests",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["endpoint"],
    )
    .unwrap()
});

// =============================================================================
// Store Metrics
// =============================================================================

/// Responses dropped because a newer request for the same resource was issued.
pub static STALE_RESPONSES_DISCARDED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bookshelf_stale_responses_discarded_total",
            "Responses discarded because a newer request superseded them",
        ),
        &["resource"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(CACHE_INVALIDATIONS.clone()),
        Box::new(GATEWAY_REQUESTS.clone()),
        Box::new(GATEWAY_REQUEST_DURATION.clone()),
        Box::new(STALE_RESPONSES_DISCARDED.clone()),
    ]
}
