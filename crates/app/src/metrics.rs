//! Process-wide registry for the catalog client metrics.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in bookshelf_core::metrics::all_metrics() {
        if let Err(e) = registry.register(metric) {
            tracing::warn!("Failed to register metric: {}", e);
        }
    }
    registry
});

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics output is not UTF-8")
}
