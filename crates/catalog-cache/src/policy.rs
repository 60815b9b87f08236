//! Cache policies.

use std::time::Duration;

use catalog_data::RetryPolicy;

/// Staleness classes for cached responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaleClass {
    /// List composition changes often.
    ShortLived,
    /// Record detail rarely changes.
    LongLived,
}

impl StaleClass {
    /// Default freshness window for this class.
    pub fn default_stale_time(&self) -> Duration {
        match self {
            Self::ShortLived => Duration::from_secs(5 * 60),
            Self::LongLived => Duration::from_secs(10 * 60),
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShortLived => "short-lived",
            Self::LongLived => "long-lived",
        }
    }
}

impl std::fmt::Display for StaleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Default number of entries a cache keeps before evicting.
pub const DEFAULT_CAPACITY: usize = 512;

/// Cache behaviour for one cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Entries younger than this are served without a network call.
    pub stale_time: Duration,
    /// Retry behaviour for failed fetches.
    pub retry: RetryPolicy,
    /// Maximum number of entries kept.
    pub capacity: usize,
}

impl CachePolicy {
    /// Create a policy for a staleness class.
    pub fn new(class: StaleClass) -> Self {
        Self {
            stale_time: class.default_stale_time(),
            retry: RetryPolicy::default(),
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Policy for list pages.
    pub fn list() -> Self {
        Self::new(StaleClass::ShortLived)
    }

    /// Policy for individual records.
    pub fn record() -> Self {
        Self::new(StaleClass::LongLived)
    }

    /// Set the freshness window.
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the entry cap. Zero is treated as one.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::list()
    }
}
