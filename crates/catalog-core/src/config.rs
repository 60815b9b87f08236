//! Browser configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors found while validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("page_size must be greater than zero")]
    ZeroPageSize,

    #[error("base_url must not be empty")]
    EmptyBaseUrl,

    #[error("backoff_base_ms ({base}) exceeds backoff_max_ms ({max})")]
    BackoffRange { base: u64, max: u64 },
}

/// Configuration shared by the fetch client, caches and controllers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Upstream API root.
    pub base_url: String,
    /// Collection path segment under `base_url`.
    pub collection: String,
    /// Items per page in both browsing modes.
    pub page_size: u32,
    /// Freshness window for list pages.
    pub list_stale_secs: u64,
    /// Freshness window for individual records.
    pub record_stale_secs: u64,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Entries kept per cache before eviction.
    pub cache_capacity: usize,
    /// Distance from the end of the list that triggers the next page.
    pub scroll_threshold: u32,
    pub request_timeout_ms: u64,
}

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Default proximity threshold for incremental loading.
pub const DEFAULT_SCROLL_THRESHOLD: u32 = 200;

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pokeapi.co/api/v2".to_string(),
            collection: "pokemon".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            list_stale_secs: 5 * 60,
            record_stale_secs: 10 * 60,
            max_retries: 3,
            backoff_base_ms: 1_000,
            backoff_max_ms: 30_000,
            cache_capacity: 512,
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
            request_timeout_ms: 10_000,
        }
    }
}

impl BrowserConfig {
    /// Check invariants the rest of the system relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if self.backoff_base_ms > self.backoff_max_ms {
            return Err(ConfigError::BackoffRange {
                base: self.backoff_base_ms,
                max: self.backoff_max_ms,
            });
        }
        Ok(())
    }

    /// Set the API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn list_stale_time(&self) -> Duration {
        Duration::from_secs(self.list_stale_secs)
    }

    pub fn record_stale_time(&self) -> Duration {
        Duration::from_secs(self.record_stale_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// URL of the collection listing endpoint.
    pub fn collection_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.collection.trim_matches('/')
        )
    }
}
