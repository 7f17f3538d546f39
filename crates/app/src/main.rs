mod metrics;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookshelf_core::{load_config, AppContext, DisplayMode};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();
    info!("bookshelf {}", VERSION);

    // Determine config path
    let config_path = std::env::var("BOOKSHELF_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    info!("Configuration loaded successfully");

    // Validates the configuration before building anything
    let context = AppContext::from_config(config, environment_display_mode())
        .context("Failed to build application context")?;
    info!("Display mode: {}", context.preferences().mode());

    let collection = context.collection();
    let items = collection.load_all(false).await;
    let top = collection.load_top(false).await;
    if let Some(failure) = context.gateway().last_error() {
        warn!("Catalog API reported an error on {}: {}", failure.key, failure.message);
    }

    let stats = collection.statistics().await;
    info!(
        "Catalog: {} items, {} languages, {} authors, {} searches ({} in top list)",
        items.len(),
        stats.total_languages,
        stats.total_contributors,
        stats.total_searches,
        top.len()
    );
    if !stats.contributors.is_empty() {
        info!("Authors: {}", stats.contributors.join(", "));
    }

    report_metrics()
}

/// Write the gathered metrics to `BOOKSHELF_METRICS_FILE` if set, otherwise
/// log them at debug level.
fn report_metrics() -> Result<()> {
    let text = metrics::encode_metrics()?;
    match std::env::var("BOOKSHELF_METRICS_FILE") {
        Ok(path) => {
            std::fs::write(&path, text)
                .with_context(|| format!("Failed to write metrics to {}", path))?;
            info!("Metrics written to {}", path);
        }
        Err(_) => debug!("Metrics:\n{}", text),
    }
    Ok(())
}

/// `BOOKSHELF_LOG_FORMAT=json` switches to JSON lines.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let json = std::env::var("BOOKSHELF_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Light/dark signal from `BOOKSHELF_PREFERS_DARK`, if set.
fn environment_display_mode() -> Option<DisplayMode> {
    let value = std::env::var("BOOKSHELF_PREFERS_DARK").ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "dark" => Some(DisplayMode::Dark),
        "0" | "false" | "no" | "light" => Some(DisplayMode::Light),
        _ => None,
    }
}
