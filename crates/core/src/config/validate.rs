use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - API base URL is an http(s) URL
/// - Timeout is not 0
/// - Cache lifetimes are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "api.base_url cannot be empty".to_string(),
        ));
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "api.base_url must start with http:// or https://, got '{}'",
            base_url
        )));
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "api.timeout_secs cannot be 0".to_string(),
        ));
    }

    let ttls = [
        ("cache.all_items_ttl_secs", config.cache.all_items_ttl_secs),
        ("cache.top_items_ttl_secs", config.cache.top_items_ttl_secs),
        ("cache.language_ttl_secs", config.cache.language_ttl_secs),
    ];
    for (name, value) in ttls {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
        }
    }

    Ok(())
}
