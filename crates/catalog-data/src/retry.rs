//! Retry policies for fetch operations.

use std::time::Duration;

use catalog_core::BrowserConfig;

use crate::client::FetchError;

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Fixed delay between retries.
    Fixed(Duration),
    /// Exponential backoff with base and max.
    Exponential {
        /// Initial delay.
        base: Duration,
        /// Maximum delay.
        max: Duration,
    },
}

impl BackoffStrategy {
    /// Calculate delay for a given attempt number (0-indexed).
    ///
    /// Exponential backoff yields `min(base * 2^attempt, max)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed(d) => *d,
            Self::Exponential { base, max } => {
                let multiplier = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
                let delay = base.checked_mul(multiplier).unwrap_or(*max);
                std::cmp::min(delay, *max)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(1_000),
            max: Duration::from_millis(30_000),
        }
    }
}

/// Conditions that trigger a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCondition {
    /// Retry on specific HTTP status code.
    StatusCode(u16),
    /// Retry on any 5xx status.
    ServerError,
    /// Retry on any 4xx status.
    ClientError,
    /// Retry on timeout.
    Timeout,
    /// Retry on connection error.
    ConnectionError,
    /// Retry when the body could not be decoded or the request could not be built.
    Malformed,
}

impl RetryCondition {
    /// Check if an error matches this condition.
    pub fn matches(&self, error: &FetchError) -> bool {
        match (self, error) {
            (Self::StatusCode(code), FetchError::Http { status, .. }) => status == code,
            (Self::ServerError, FetchError::Http { status, .. }) => (500..600).contains(status),
            (Self::ClientError, FetchError::Http { status, .. }) => (400..500).contains(status),
            (Self::Timeout, FetchError::Timeout(_)) => true,
            (Self::ConnectionError, FetchError::Connection(_)) => true,
            (Self::Malformed, FetchError::Deserialization(_) | FetchError::Request(_)) => true,
            _ => false,
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
    /// Conditions that trigger retry.
    pub retry_on: Vec<RetryCondition>,
}

impl RetryPolicy {
    /// Create a new retry policy that retries every fetch failure.
    ///
    /// Missing records are retried as well; the caller only learns the
    /// outcome once retries are exhausted.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::default(),
            retry_on: vec![
                RetryCondition::ServerError,
                RetryCondition::ClientError,
                RetryCondition::Timeout,
                RetryCondition::ConnectionError,
                RetryCondition::Malformed,
            ],
        }
    }

    /// Create a policy with no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: BackoffStrategy::None,
            retry_on: Vec::new(),
        }
    }

    /// Build from the browser configuration.
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self::new(config.max_retries).with_backoff(BackoffStrategy::Exponential {
            base: config.backoff_base(),
            max: config.backoff_max(),
        })
    }

    /// Set backoff strategy.
    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    /// Set retry conditions.
    pub fn with_conditions(mut self, conditions: Vec<RetryCondition>) -> Self {
        self.retry_on = conditions;
        self
    }

    /// Whether a failure on `attempt` (0-indexed) should be retried.
    pub fn should_retry(&self, error: &FetchError, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        self.retry_on.iter().any(|c| c.matches(error))
    }

    /// Delay before the retry that follows a failure on `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay_for_attempt(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> FetchError {
        FetchError::Http {
            status,
            url: "u".to_string(),
        }
    }

    #[test]
    fn test_exponential_delays() {
        let backoff = BackoffStrategy::default();
        assert_eq!(backoff.delay_for_attempt(0), Duration::from_millis(1_000));
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_millis(2_000));
        assert_eq!(backoff.delay_for_attempt(2), Duration::from_millis(4_000));
        assert_eq!(backoff.delay_for_attempt(4), Duration::from_millis(16_000));
        assert_eq!(backoff.delay_for_attempt(5), Duration::from_millis(30_000));
    }

    #[test]
    fn test_exponential_delay_saturates() {
        let backoff = BackoffStrategy::default();
        assert_eq!(backoff.delay_for_attempt(40), Duration::from_millis(30_000));
        assert_eq!(backoff.delay_for_attempt(u32::MAX), Duration::from_millis(30_000));
    }

    #[test]
    fn test_fixed_and_none() {
        assert_eq!(BackoffStrategy::None.delay_for_attempt(3), Duration::ZERO);
        let fixed = BackoffStrategy::Fixed(Duration::from_millis(250));
        assert_eq!(fixed.delay_for_attempt(7), Duration::from_millis(250));
    }

    #[test]
    fn test_should_retry_respects_limit() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(&http(500), 0));
        assert!(policy.should_retry(&http(500), 2));
        assert!(!policy.should_retry(&http(500), 3));
    }

    #[test]
    fn test_should_retry_conditions() {
        let policy = RetryPolicy::new(3).with_conditions(vec![RetryCondition::ServerError]);
        assert!(policy.should_retry(&http(502), 0));
        assert!(!policy.should_retry(&http(404), 0));
        assert!(!policy.should_retry(&FetchError::Timeout("t".to_string()), 0));

        let policy = RetryPolicy::new(1).with_conditions(vec![RetryCondition::StatusCode(429)]);
        assert!(policy.should_retry(&http(429), 0));
        assert!(!policy.should_retry(&http(503), 0));
    }

    #[test]
    fn test_none_never_retries() {
        assert!(!RetryPolicy::none().should_retry(&http(500), 0));
    }

    #[test]
    fn test_from_config() {
        let config = BrowserConfig {
            max_retries: 5,
            backoff_base_ms: 100,
            backoff_max_ms: 800,
            ..BrowserConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(800));
    }
}
