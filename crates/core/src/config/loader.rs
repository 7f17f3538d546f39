use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix shared by every bookshelf environment variable.
const ENV_PREFIX: &str = "BOOKSHELF_";

/// Config sections that environment variables may override.
const SECTIONS: [&str; 3] = ["api", "cache", "preferences"];

/// Read the TOML file at `path`, then apply `BOOKSHELF_<SECTION>__<KEY>`
/// overrides, e.g. `BOOKSHELF_API__BASE_URL` or
/// `BOOKSHELF_CACHE__TOP_ITEMS_TTL_SECS`.
///
/// Other `BOOKSHELF_` variables (log format, config path) belong to the
/// binary and are not treated as config keys.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(section_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parse a config from TOML text without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn section_overrides() -> Env {
    Env::prefixed(ENV_PREFIX)
        .filter(|key| is_section_key(key.as_str()))
        .split("__")
}

/// Whether an unprefixed variable name addresses a key inside a config
/// section, like `API__BASE_URL`.
fn is_section_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SECTIONS.iter().any(|section| {
        key.strip_prefix(section)
            .and_then(|rest| rest.strip_prefix("__"))
            .is_some_and(|field| !field.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[api]
base_url = "http://catalog.local/api"

[cache]
top_items_ttl_secs = 10
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.api.base_url, "http://catalog.local/api");
        assert_eq!(config.cache.top_items_ttl(), Duration::from_secs(10));
        assert_eq!(config.cache.all_items_ttl(), Duration::from_secs(300));
        assert_eq!(config.cache.language_ttl(), Duration::from_secs(180));
    }

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_load_config_from_str_wrong_type() {
        let toml = r#"
[api]
timeout_secs = "soon"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[api]
base_url = "https://books.example.com/api"
timeout_secs = 5

[preferences]
path = "/tmp/prefs.json"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://books.example.com/api");
        assert_eq!(config.api.timeout(), Duration::from_secs(5));
        assert_eq!(config.preferences.path.to_str(), Some("/tmp/prefs.json"));
    }

    #[test]
    fn test_only_section_variables_override_config() {
        assert!(is_section_key("API__BASE_URL"));
        assert!(is_section_key("cache__language_ttl_secs"));
        assert!(is_section_key("PREFERENCES__PATH"));

        assert!(!is_section_key("CONFIG"));
        assert!(!is_section_key("LOG_FORMAT"));
        assert!(!is_section_key("PREFERS_DARK"));
        assert!(!is_section_key("APIX__BASE_URL"));
        assert!(!is_section_key("API__"));
    }
}
