//! Result cache with single flight, staleness windows and retry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use catalog_data::{FetchError, RetryPolicy};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;

use crate::key::CacheKey;
use crate::policy::CachePolicy;
use crate::state::{CacheStats, CacheStatus, EntryState, Lookup, QueryState};

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, FetchError>>>;

struct InFlight<V> {
    seq: u64,
    fetch: SharedFetch<V>,
}

struct Slot<V> {
    value: Option<V>,
    fetched_at: Option<Instant>,
    error: Option<FetchError>,
    retry_count: u32,
    in_flight: Option<InFlight<V>>,
    /// Sequence number of the completion currently applied.
    applied_seq: u64,
    /// Completions of fetches issued before this slot existed are dropped.
    floor_seq: u64,
    last_access: u64,
}

impl<V> Slot<V> {
    fn empty(floor_seq: u64, tick: u64) -> Self {
        Self {
            value: None,
            fetched_at: None,
            error: None,
            retry_count: 0,
            in_flight: None,
            applied_seq: 0,
            floor_seq,
            last_access: tick,
        }
    }

    fn is_fresh(&self, now: Instant, policy: &CachePolicy) -> bool {
        match self.fetched_at {
            Some(at) => now.saturating_duration_since(at) < policy.stale_time,
            None => false,
        }
    }

    fn state(&self, now: Instant, policy: &CachePolicy) -> EntryState {
        if self.in_flight.is_some() {
            EntryState::Fetching
        } else if self.value.is_none() {
            EntryState::Failed
        } else if self.is_fresh(now, policy) {
            EntryState::Fresh
        } else {
            EntryState::Stale
        }
    }
}

struct Inner<V> {
    slots: HashMap<CacheKey, Slot<V>>,
    next_seq: u64,
    tick: u64,
    stats: CacheStats,
}

impl<V> Inner<V> {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Drop the least recently used idle entry if `key` would exceed capacity.
    fn make_room(&mut self, key: &CacheKey, capacity: usize) {
        if self.slots.contains_key(key) || self.slots.len() < capacity {
            return;
        }

        let victim = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.in_flight.is_none())
            .min_by_key(|(_, slot)| slot.last_access)
            .map(|(k, _)| k.clone());

        if let Some(victim) = victim {
            tracing::debug!(key = %victim, "evicting cache entry");
            self.slots.remove(&victim);
            self.stats.evictions += 1;
        }
    }
}

/// What a lookup decided to do once the lock is released.
enum Action<V> {
    Ready(Lookup<V>),
    Fail(FetchError),
    Await(SharedFetch<V>, CacheStatus),
}

/// Memoizes fetch results per key.
///
/// - Fresh entries are returned without a network call.
/// - Stale entries are returned immediately while one background refresh runs.
/// - Concurrent lookups of a key share one in-flight fetch.
/// - Failed fetches are retried with backoff; once retries are exhausted the
///   entry is `Failed` until `retry` is called.
///
/// Fetches run on their own tokio task, so a caller that stops waiting does
/// not cancel the fetch and the result still lands in the cache.
pub struct ResultCache<V> {
    inner: Arc<Mutex<Inner<V>>>,
    policy: Arc<CachePolicy>,
}

impl<V> Clone for ResultCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            policy: Arc::clone(&self.policy),
        }
    }
}

impl<V> ResultCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty cache.
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                slots: HashMap::new(),
                next_seq: 1,
                tick: 0,
                stats: CacheStats::default(),
            })),
            policy: Arc::new(policy),
        }
    }

    /// The policy this cache was built with.
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Look up `key`, calling `fetcher` on a miss or to revalidate stale data.
    ///
    /// `fetcher` may be called several times when retrying.
    pub async fn get<F, Fut>(&self, key: CacheKey, fetcher: F) -> Result<Lookup<V>, FetchError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let action = {
            let mut inner = lock(&self.inner);
            let now = Instant::now();
            let tick = inner.next_tick();

            let existing = inner.slots.get_mut(&key).map(|slot| {
                slot.last_access = tick;
                let in_flight = slot.in_flight.as_ref().map(|f| f.fetch.clone());
                let fresh = slot.is_fresh(now, &self.policy);
                (slot.value.clone(), in_flight, slot.error.clone(), fresh)
            });

            match existing {
                Some((Some(value), in_flight, _, true)) => {
                    inner.stats.hits += 1;
                    tracing::debug!(key = %key, "cache hit");
                    Action::Ready(Lookup {
                        value,
                        status: CacheStatus::Hit,
                        refreshing: in_flight.is_some(),
                    })
                }
                Some((Some(value), in_flight, _, false)) => {
                    inner.stats.stale_hits += 1;
                    if in_flight.is_none() {
                        tracing::debug!(key = %key, "stale hit, revalidating");
                        self.start_fetch(&mut inner, key, Arc::new(fetcher));
                    }
                    Action::Ready(Lookup {
                        value,
                        status: CacheStatus::Stale,
                        refreshing: true,
                    })
                }
                Some((None, Some(fetch), _, _)) => {
                    inner.stats.joined += 1;
                    tracing::debug!(key = %key, "joining in-flight fetch");
                    Action::Await(fetch, CacheStatus::Joined)
                }
                Some((None, None, Some(error), _)) => Action::Fail(error),
                _ => {
                    inner.stats.misses += 1;
                    tracing::debug!(key = %key, "cache miss");
                    let fetch = self.start_fetch(&mut inner, key, Arc::new(fetcher));
                    Action::Await(fetch, CacheStatus::Miss)
                }
            }
        };

        match action {
            Action::Ready(lookup) => Ok(lookup),
            Action::Fail(error) => Err(error),
            Action::Await(fetch, status) => Ok(Lookup {
                value: fetch.await?,
                status,
                refreshing: false,
            }),
        }
    }

    /// Manually retry `key`: clears a `Failed` state and fetches again from
    /// attempt 0. Joins the in-flight fetch if there is one.
    pub async fn retry<F, Fut>(&self, key: CacheKey, fetcher: F) -> Result<Lookup<V>, FetchError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let (fetch, status) = {
            let mut inner = lock(&self.inner);
            let tick = inner.next_tick();
            let in_flight = inner.slots.get_mut(&key).and_then(|slot| {
                slot.last_access = tick;
                slot.error = None;
                slot.in_flight.as_ref().map(|f| f.fetch.clone())
            });

            match in_flight {
                Some(fetch) => (fetch, CacheStatus::Joined),
                None => {
                    tracing::info!(key = %key, "manual retry");
                    let fetch = self.start_fetch(&mut inner, key, Arc::new(fetcher));
                    (fetch, CacheStatus::Miss)
                }
            }
        };

        Ok(Lookup {
            value: fetch.await?,
            status,
            refreshing: false,
        })
    }

    /// Current state of `key`. Never triggers a fetch.
    pub fn state(&self, key: &CacheKey) -> QueryState<V> {
        let inner = lock(&self.inner);
        let Some(slot) = inner.slots.get(key) else {
            return QueryState::idle();
        };

        let is_fetching = slot.in_flight.is_some();
        QueryState {
            data: slot.value.clone(),
            entry_state: Some(slot.state(Instant::now(), &self.policy)),
            is_loading: is_fetching && slot.value.is_none(),
            is_fetching,
            error: slot.error.clone(),
            retry_count: slot.retry_count,
            fetched_at: slot.fetched_at,
        }
    }

    /// Cached value for `key`, fresh or stale.
    pub fn peek(&self, key: &CacheKey) -> Option<V> {
        lock(&self.inner).slots.get(key).and_then(|s| s.value.clone())
    }

    /// Forget `key`. An in-flight fetch still resolves for its waiters but
    /// its result is not stored.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        lock(&self.inner).slots.remove(key).is_some()
    }

    /// Forget everything.
    pub fn clear(&self) {
        lock(&self.inner).slots.clear();
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        lock(&self.inner).slots.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counters since creation.
    pub fn stats(&self) -> CacheStats {
        lock(&self.inner).stats
    }

    fn start_fetch<F, Fut>(&self, inner: &mut Inner<V>, key: CacheKey, fetcher: Arc<F>) -> SharedFetch<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        inner.make_room(&key, self.policy.capacity);

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.stats.fetches += 1;
        let tick = inner.next_tick();

        let shared_inner = Arc::clone(&self.inner);
        let retry = self.policy.retry.clone();
        let task_key = key.clone();

        let fetch = async move {
            let result = fetch_with_retry(&*fetcher, &retry, &shared_inner, &task_key, seq).await;
            complete(&shared_inner, &task_key, seq, &result);
            result
        }
        .boxed()
        .shared();

        let slot = inner
            .slots
            .entry(key)
            .or_insert_with(|| Slot::empty(seq, tick));
        slot.retry_count = 0;
        slot.in_flight = Some(InFlight {
            seq,
            fetch: fetch.clone(),
        });

        tokio::spawn(fetch.clone());
        fetch
    }
}

async fn fetch_with_retry<V, F, Fut>(
    fetcher: &F,
    retry: &RetryPolicy,
    inner: &Mutex<Inner<V>>,
    key: &CacheKey,
    seq: u64,
) -> Result<V, FetchError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<V, FetchError>>,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(value),
            Err(error) if retry.should_retry(&error, attempt) => {
                let delay = retry.delay_for_attempt(attempt);
                attempt += 1;
                tracing::warn!(
                    key = %key,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "fetch failed, retrying"
                );
                record_retry(inner, key, seq, attempt);
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                tracing::error!(key = %key, attempts = attempt + 1, error = %error, "fetch failed");
                return Err(error);
            }
        }
    }
}

fn record_retry<V>(inner: &Mutex<Inner<V>>, key: &CacheKey, seq: u64, attempt: u32) {
    let mut inner = lock(inner);
    inner.stats.retries += 1;
    if let Some(slot) = inner.slots.get_mut(key) {
        if slot.in_flight.as_ref().map(|f| f.seq) == Some(seq) {
            slot.retry_count = attempt;
        }
    }
}

/// Apply a finished fetch unless a newer one for the same key already landed.
fn complete<V: Clone>(inner: &Mutex<Inner<V>>, key: &CacheKey, seq: u64, result: &Result<V, FetchError>) {
    let mut inner = lock(inner);
    let Inner { slots, stats, .. } = &mut *inner;

    if result.is_err() {
        stats.failures += 1;
    }

    let Some(slot) = slots.get_mut(key) else {
        return;
    };

    if slot.in_flight.as_ref().map(|f| f.seq) == Some(seq) {
        slot.in_flight = None;
    }

    if seq < slot.floor_seq || seq < slot.applied_seq {
        stats.ignored_completions += 1;
        tracing::debug!(key = %key, seq, "ignoring out-of-order completion");
        return;
    }

    slot.applied_seq = seq;
    match result {
        Ok(value) => {
            slot.value = Some(value.clone());
            slot.fetched_at = Some(Instant::now());
            slot.error = None;
        }
        Err(error) => {
            slot.error = Some(error.clone());
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn http(status: u16) -> FetchError {
        FetchError::Http {
            status,
            url: "memory://test".to_string(),
        }
    }

    /// Fetcher returning the call number, after `latency`.
    fn counting(
        calls: &Arc<AtomicUsize>,
        latency: Duration,
    ) -> impl Fn() -> BoxFuture<'static, Result<usize, FetchError>> + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                tokio::time::sleep(latency).await;
                Ok(n)
            }
            .boxed()
        }
    }

    /// Fetcher failing its first `failures` calls.
    fn flaky(
        calls: &Arc<AtomicUsize>,
        failures: usize,
    ) -> impl Fn() -> BoxFuture<'static, Result<usize, FetchError>> + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n <= failures {
                    Err(http(503))
                } else {
                    Ok(n)
                }
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_get_fetches_and_stores() {
        let cache = ResultCache::new(CachePolicy::list());
        let calls = Arc::new(AtomicUsize::new(0));

        let lookup = cache
            .get(CacheKey::list(20, 0), counting(&calls, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(lookup.value, 1);
        assert_eq!(lookup.status, CacheStatus::Miss);
        let state = cache.state(&CacheKey::list(20, 0));
        assert_eq!(state.entry_state, Some(EntryState::Fresh));
        assert_eq!(state.data, Some(1));
        assert!(!state.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_gets_share_one_fetch() {
        let cache = ResultCache::new(CachePolicy::list());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::list(20, 0);

        let (a, b) = tokio::join!(
            cache.get(key.clone(), counting(&calls, Duration::from_millis(100))),
            cache.get(key.clone(), counting(&calls, Duration::from_millis(100))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.value, b.value);
        assert_eq!(a.status, CacheStatus::Miss);
        assert_eq!(b.status, CacheStatus::Joined);
        assert_eq!(cache.stats().joined, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_flag_during_first_fetch() {
        let cache = ResultCache::new(CachePolicy::list());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::list(20, 0);

        let task = {
            let cache = cache.clone();
            let fetcher = counting(&calls, Duration::from_millis(500));
            let key = key.clone();
            tokio::spawn(async move { cache.get(key, fetcher).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let state = cache.state(&key);
        assert!(state.is_loading);
        assert!(state.is_fetching);
        assert_eq!(state.entry_state, Some(EntryState::Fetching));

        task.await.unwrap().unwrap();
        assert!(!cache.state(&key).is_fetching);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_within_stale_time() {
        let cache = ResultCache::new(CachePolicy::list());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::list(20, 0);

        cache.get(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();
        tokio::time::advance(Duration::from_secs(300) - Duration::from_millis(1)).await;

        let lookup = cache.get(key, counting(&calls, Duration::ZERO)).await.unwrap();
        assert_eq!(lookup.status, CacheStatus::Hit);
        assert!(!lookup.refreshing);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_serves_cached_and_refreshes_once() {
        let cache = ResultCache::new(CachePolicy::list());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::list(20, 0);

        cache.get(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();
        tokio::time::advance(Duration::from_secs(300) + Duration::from_millis(1)).await;

        let first = cache
            .get(key.clone(), counting(&calls, Duration::from_millis(50)))
            .await
            .unwrap();
        assert_eq!(first.value, 1);
        assert_eq!(first.status, CacheStatus::Stale);
        assert!(first.refreshing);

        let state = cache.state(&key);
        assert!(state.is_refreshing());
        assert!(!state.is_loading);

        let second = cache
            .get(key.clone(), counting(&calls, Duration::from_millis(50)))
            .await
            .unwrap();
        assert_eq!(second.value, 1);
        assert_eq!(second.status, CacheStatus::Stale);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let refreshed = cache.get(key, counting(&calls, Duration::ZERO)).await.unwrap();
        assert_eq!(refreshed.value, 2);
        assert_eq!(refreshed.status, CacheStatus::Hit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_with_backoff_then_success() {
        let cache = ResultCache::new(CachePolicy::list());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::list(20, 0);

        let start = Instant::now();
        let lookup = cache.get(key.clone(), flaky(&calls, 2)).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(lookup.value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(elapsed >= Duration::from_millis(3_000));
        assert!(elapsed < Duration::from_millis(3_100));

        let state = cache.state(&key);
        assert_eq!(state.retry_count, 2);
        assert_eq!(state.error, None);
        assert_eq!(cache.stats().retries, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_fail_until_manual_retry() {
        let cache = ResultCache::new(CachePolicy::list());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::list(20, 0);

        let err = cache.get(key.clone(), flaky(&calls, 4)).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        let state = cache.state(&key);
        assert!(state.is_failed());
        assert_eq!(state.retry_count, 3);

        // Failed entries do not refetch on their own.
        assert!(cache.get(key.clone(), flaky(&calls, 4)).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        let lookup = cache.retry(key.clone(), flaky(&calls, 4)).await.unwrap();
        assert_eq!(lookup.value, 5);
        let state = cache.state(&key);
        assert_eq!(state.entry_state, Some(EntryState::Fresh));
        assert_eq!(state.retry_count, 0);
        assert_eq!(cache.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_all_see_failure() {
        let cache = ResultCache::new(CachePolicy::list().with_retry(RetryPolicy::none()));
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::record("missing");

        let slow_failure = {
            let calls = Arc::clone(&calls);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Err::<usize, _>(http(404))
                }
                .boxed()
            }
        };

        let (a, b) = tokio::join!(
            cache.get(key.clone(), slow_failure.clone()),
            cache.get(key.clone(), slow_failure),
        );
        assert!(a.unwrap_err().is_not_found());
        assert!(b.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_order_completion_is_ignored() {
        let cache: ResultCache<&'static str> = ResultCache::new(CachePolicy::list());
        let key = CacheKey::list(20, 0);

        let slow = {
            let cache = cache.clone();
            let key = key.clone();
            tokio::spawn(async move {
                cache
                    .get(key, || async {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        Ok("old")
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(cache.invalidate(&key));
        let fresh = cache.get(key.clone(), || async { Ok("new") }).await.unwrap();
        assert_eq!(fresh.value, "new");

        // The superseded fetch still answers its own caller.
        assert_eq!(slow.await.unwrap().unwrap().value, "old");
        assert_eq!(cache.peek(&key), Some("new"));
        assert_eq!(cache.stats().ignored_completions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_fetch_still_populates() {
        let cache = ResultCache::new(CachePolicy::list());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::list(20, 0);

        let task = {
            let cache = cache.clone();
            let fetcher = counting(&calls, Duration::from_millis(200));
            let key = key.clone();
            tokio::spawn(async move { cache.get(key, fetcher).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        task.abort();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(cache.peek(&key), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_least_recently_used() {
        let cache = ResultCache::new(CachePolicy::list().with_capacity(2));
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get(CacheKey::list(20, 0), counting(&calls, Duration::ZERO)).await.unwrap();
        cache.get(CacheKey::list(20, 20), counting(&calls, Duration::ZERO)).await.unwrap();
        // Touch the first page so the second becomes least recently used.
        cache.get(CacheKey::list(20, 0), counting(&calls, Duration::ZERO)).await.unwrap();
        cache.get(CacheKey::list(20, 40), counting(&calls, Duration::ZERO)).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.peek(&CacheKey::list(20, 0)).is_some());
        assert!(cache.peek(&CacheKey::list(20, 20)).is_none());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_of_unknown_key_is_idle() {
        let cache: ResultCache<u32> = ResultCache::new(CachePolicy::record());
        let state = cache.state(&CacheKey::record("1"));
        assert_eq!(state, QueryState::idle());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_and_refetch() {
        let cache = ResultCache::new(CachePolicy::record());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::record("25");

        cache.get(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();
        cache.clear();
        let lookup = cache.get(key, counting(&calls, Duration::ZERO)).await.unwrap();
        assert_eq!(lookup.status, CacheStatus::Miss);
        assert_eq!(lookup.value, 2);
    }
}
