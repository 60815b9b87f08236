//! Timeout configuration for fetch operations.

use std::time::Duration;

/// Timeout configuration for a fetch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Connection timeout.
    pub connect: Duration,
    /// Total operation timeout.
    pub total: Duration,
}

impl TimeoutConfig {
    /// Create a new timeout configuration.
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self { connect, total }
    }

    /// Create from a single total timeout; connecting may use a quarter of it.
    pub fn from_total(total: Duration) -> Self {
        Self {
            connect: total / 4,
            total,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::from_total(Duration::from_secs(10))
    }
}
