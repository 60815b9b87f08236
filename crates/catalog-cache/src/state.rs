//! Observable cache state.

use catalog_data::FetchError;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Lifecycle state of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    /// Value present and inside its freshness window.
    Fresh,
    /// Value present but past its freshness window.
    Stale,
    /// A fetch is in flight.
    Fetching,
    /// Retries exhausted with no value to show.
    Failed,
}

impl std::fmt::Display for EntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fresh => write!(f, "fresh"),
            Self::Stale => write!(f, "stale"),
            Self::Fetching => write!(f, "fetching"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// How a lookup was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Fresh cache hit.
    Hit,
    /// Stale hit (serving while revalidating).
    Stale,
    /// Cache miss, this call issued the fetch.
    Miss,
    /// Joined a fetch another caller had already issued.
    Joined,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Stale => write!(f, "STALE"),
            Self::Miss => write!(f, "MISS"),
            Self::Joined => write!(f, "JOINED"),
        }
    }
}

/// Result of a successful `get`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<V> {
    pub value: V,
    pub status: CacheStatus,
    /// A background refresh is in flight for this key.
    pub refreshing: bool,
}

/// Snapshot of one key, for rendering loading and error states.
///
/// `is_loading` means nothing can be shown yet; `is_fetching` means a
/// request is in flight, whether or not data is already shown.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<V> {
    pub data: Option<V>,
    pub entry_state: Option<EntryState>,
    pub is_loading: bool,
    pub is_fetching: bool,
    pub error: Option<FetchError>,
    pub retry_count: u32,
    pub fetched_at: Option<Instant>,
}

impl<V> QueryState<V> {
    /// State of a key the cache has never seen.
    pub fn idle() -> Self {
        Self {
            data: None,
            entry_state: None,
            is_loading: false,
            is_fetching: false,
            error: None,
            retry_count: 0,
            fetched_at: None,
        }
    }

    /// Data is shown and a refresh is running behind it.
    pub fn is_refreshing(&self) -> bool {
        self.data.is_some() && self.is_fetching
    }

    /// Retries exhausted and nothing to show.
    pub fn is_failed(&self) -> bool {
        self.entry_state == Some(EntryState::Failed)
    }
}

impl<V> Default for QueryState<V> {
    fn default() -> Self {
        Self::idle()
    }
}

/// Counters describing cache behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
    pub joined: u64,
    pub fetches: u64,
    pub retries: u64,
    pub failures: u64,
    pub evictions: u64,
    /// Completions dropped because a newer fetch for the key had already landed.
    pub ignored_completions: u64,
}

impl CacheStats {
    /// Share of lookups served from cache (fresh or stale).
    pub fn hit_ratio(&self) -> f64 {
        let served = self.hits + self.stale_hits;
        let total = served + self.misses + self.joined;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_state() {
        let state: QueryState<u32> = QueryState::idle();
        assert!(!state.is_loading);
        assert!(!state.is_refreshing());
        assert!(!state.is_failed());
    }

    #[test]
    fn test_refreshing_requires_data() {
        let mut state: QueryState<u32> = QueryState {
            is_fetching: true,
            ..QueryState::idle()
        };
        assert!(!state.is_refreshing());
        state.data = Some(1);
        assert!(state.is_refreshing());
    }

    #[test]
    fn test_hit_ratio() {
        let stats = CacheStats {
            hits: 3,
            stale_hits: 1,
            misses: 4,
            ..CacheStats::default()
        };
        assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().hit_ratio(), 0.0);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(CacheStatus::Joined.to_string(), "JOINED");
        assert_eq!(EntryState::Failed.to_string(), "failed");
    }
}
