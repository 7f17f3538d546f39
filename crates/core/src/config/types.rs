use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

/// Remote catalog API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix (e.g., "http://localhost:8080/api")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_secs))
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Cache lifetimes, one per resource class
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_all_items_ttl")]
    pub all_items_ttl_secs: u64,
    #[serde(default = "default_top_items_ttl")]
    pub top_items_ttl_secs: u64,
    #[serde(default = "default_language_ttl")]
    pub language_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            all_items_ttl_secs: default_all_items_ttl(),
            top_items_ttl_secs: default_top_items_ttl(),
            language_ttl_secs: default_language_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn all_items_ttl(&self) -> Duration {
        Duration::from_secs(self.all_items_ttl_secs)
    }

    pub fn top_items_ttl(&self) -> Duration {
        Duration::from_secs(self.top_items_ttl_secs)
    }

    pub fn language_ttl(&self) -> Duration {
        Duration::from_secs(self.language_ttl_secs)
    }
}

fn default_all_items_ttl() -> u64 {
    5 * 60
}

fn default_top_items_ttl() -> u64 {
    2 * 60
}

fn default_language_ttl() -> u64 {
    3 * 60
}

/// Display preference persistence
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreferencesConfig {
    #[serde(default = "default_preferences_path")]
    pub path: PathBuf,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("bookshelf-preferences.json")
}
