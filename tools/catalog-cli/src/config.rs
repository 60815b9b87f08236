//! CLI configuration.

use std::path::Path;

use anyhow::{Context, Result};
use catalog_core::BrowserConfig;
use serde::{Deserialize, Serialize};

/// File names searched for, nearest directory first.
pub const CONFIG_NAMES: [&str; 3] = ["catalog.toml", ".catalog.toml", "catalog.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Catalog browsing configuration.
    #[serde(default)]
    pub catalog: BrowserConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

pub(crate) fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Generate a default catalog.toml config file.
pub fn generate_default_config() -> String {
    let defaults = BrowserConfig::default();
    format!(
        r#"# Catalog browser configuration

[catalog]
base_url = "{base_url}"
collection = "{collection}"
page_size = {page_size}

# Freshness windows, in seconds
list_stale_secs = {list_stale}
record_stale_secs = {record_stale}

# Automatic retries with exponential backoff
max_retries = {retries}
backoff_base_ms = {backoff_base}
backoff_max_ms = {backoff_max}

cache_capacity = {capacity}
scroll_threshold = {threshold}
request_timeout_ms = {timeout}
"#,
        base_url = defaults.base_url,
        collection = defaults.collection,
        page_size = defaults.page_size,
        list_stale = defaults.list_stale_secs,
        record_stale = defaults.record_stale_secs,
        retries = defaults.max_retries,
        backoff_base = defaults.backoff_base_ms,
        backoff_max = defaults.backoff_max_ms,
        capacity = defaults.cache_capacity,
        threshold = defaults.scroll_threshold,
        timeout = defaults.request_timeout_ms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_parses_to_defaults() {
        let parsed: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(parsed, CliConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let parsed: CliConfig = toml::from_str("[catalog]\npage_size = 50\n").unwrap();
        assert_eq!(parsed.catalog.page_size, 50);
        assert_eq!(parsed.catalog.max_retries, 3);
    }

    #[test]
    fn test_empty_file() {
        let parsed: CliConfig = toml::from_str("").unwrap();
        assert_eq!(parsed, CliConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("catalog-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        for name in ["saved.toml", "saved.json"] {
            let path = dir.join(name);
            let mut config = CliConfig::default();
            config.catalog.page_size = 12;
            config.save(&path).unwrap();
            assert_eq!(CliConfig::load(&path).unwrap(), config);
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = CliConfig::load("/nonexistent/catalog.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}
