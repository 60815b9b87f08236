//! Continuous loading as the reader approaches the end of the list.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use catalog_cache::{CacheKey, CacheStatus, ResultCache};
use catalog_core::{CatalogPage, ListItem, DEFAULT_SCROLL_THRESHOLD};
use catalog_data::{CatalogSource, FetchError};
use serde::{Deserialize, Serialize};

use crate::error::BrowseError;
use crate::fetch;

/// Scroll geometry at one moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub scroll_top: u32,
    pub viewport_height: u32,
    pub content_height: u32,
}

impl ScrollMetrics {
    pub fn new(scroll_top: u32, viewport_height: u32, content_height: u32) -> Self {
        Self {
            scroll_top,
            viewport_height,
            content_height,
        }
    }

    /// Distance between the bottom of the viewport and the end of the content.
    pub fn distance_to_end(&self) -> u32 {
        self.content_height
            .saturating_sub(self.scroll_top.saturating_add(self.viewport_height))
    }
}

/// Outcome of asking for the next page.
#[derive(Debug, Clone, PartialEq)]
pub enum NextPage {
    /// A page was fetched and its items appended.
    Appended { offset: u32, items: Vec<ListItem> },
    /// Another fetch is already running; nothing was issued.
    AlreadyFetching,
    /// The last page had no next reference.
    Exhausted,
}

/// Everything an incremental view needs to render.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub items: Vec<ListItem>,
    pub pages_loaded: usize,
    pub has_more: bool,
    /// First page in flight, nothing to show yet.
    pub is_loading: bool,
    /// A follow-up page is in flight below existing items.
    pub is_fetching_next: bool,
    pub error: Option<FetchError>,
}

#[derive(Default)]
struct Feed {
    pages: Vec<CatalogPage>,
    is_loading: bool,
    is_fetching_next: bool,
    error: Option<FetchError>,
    /// Bumped on reset so completions for an older feed are dropped.
    generation: u64,
}

impl Feed {
    fn has_more(&self) -> bool {
        self.pages.last().map(CatalogPage::has_next).unwrap_or(true)
    }

    fn in_flight(&self) -> bool {
        self.is_loading || self.is_fetching_next
    }

    fn items(&self) -> Vec<ListItem> {
        self.pages
            .iter()
            .flat_map(|page| page.items.iter().cloned())
            .collect()
    }
}

/// Drives incremental browsing.
///
/// Pages are requested at offsets `0, page_size, 2 * page_size, ...` in
/// order, one at a time. The upstream next reference is consulted only to
/// decide whether another page exists.
pub struct IncrementalController {
    source: Arc<dyn CatalogSource>,
    pages: ResultCache<CatalogPage>,
    page_size: u32,
    threshold: u32,
    feed: Mutex<Feed>,
}

impl IncrementalController {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        pages: ResultCache<CatalogPage>,
        page_size: u32,
    ) -> Self {
        Self {
            source,
            pages,
            page_size,
            threshold: DEFAULT_SCROLL_THRESHOLD,
            feed: Mutex::new(Feed::default()),
        }
    }

    /// Set the proximity threshold for loading the next page.
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    fn lock(&self) -> MutexGuard<'_, Feed> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn offset_for(&self, index: usize) -> u32 {
        (index as u32).saturating_mul(self.page_size)
    }

    /// Rebuild the feed from pages already in the cache.
    ///
    /// Walks successive offsets from zero and stops at the first page that
    /// is missing or has no successor. Stale pages are shown as cached and
    /// revalidated in the background. Returns the number of pages restored.
    pub async fn rehydrate(&self) -> usize {
        let generation = {
            let feed = self.lock();
            if !feed.pages.is_empty() || feed.in_flight() {
                return 0;
            }
            feed.generation
        };

        let mut restored = Vec::new();
        let mut revalidating = 0;
        loop {
            let offset = self.offset_for(restored.len());
            let key = CacheKey::list(self.page_size, offset);
            if self.pages.peek(&key).is_none() {
                break;
            }
            let fetcher = fetch::list_page(&self.source, self.page_size, offset);
            let Ok(lookup) = self.pages.get(key, fetcher).await else {
                break;
            };
            if lookup.status == CacheStatus::Stale {
                revalidating += 1;
            }
            let terminal = !lookup.value.has_next();
            restored.push(lookup.value);
            if terminal {
                break;
            }
        }

        let mut feed = self.lock();
        if feed.generation != generation || !feed.pages.is_empty() || feed.in_flight() {
            return 0;
        }
        let count = restored.len();
        feed.pages = restored;
        if count > 0 {
            tracing::debug!(pages = count, revalidating, "feed restored from cache");
        }
        count
    }

    /// Show the first page, restoring earlier pages from the cache if any.
    pub async fn load_initial(&self) -> Result<Vec<ListItem>, BrowseError> {
        self.rehydrate().await;
        if self.lock().pages.is_empty() {
            self.fetch_next_page().await?;
        }
        Ok(self.items())
    }

    /// Fetch and append the next page.
    pub async fn fetch_next_page(&self) -> Result<NextPage, BrowseError> {
        self.request_next(false).await
    }

    /// Retry the page that failed last.
    pub async fn retry(&self) -> Result<NextPage, BrowseError> {
        self.request_next(true).await
    }

    async fn request_next(&self, retry: bool) -> Result<NextPage, BrowseError> {
        let (offset, generation) = {
            let mut feed = self.lock();
            if feed.in_flight() {
                return Ok(NextPage::AlreadyFetching);
            }
            if !feed.has_more() {
                return Ok(NextPage::Exhausted);
            }
            if feed.pages.is_empty() {
                feed.is_loading = true;
            } else {
                feed.is_fetching_next = true;
            }
            feed.error = None;
            (self.offset_for(feed.pages.len()), feed.generation)
        };

        tracing::debug!(offset, limit = self.page_size, retry, "fetching next page");
        let key = CacheKey::list(self.page_size, offset);
        let fetcher = fetch::list_page(&self.source, self.page_size, offset);
        let result = if retry {
            self.pages.retry(key, fetcher).await
        } else {
            self.pages.get(key, fetcher).await
        };

        let mut feed = self.lock();
        if feed.generation != generation {
            tracing::debug!(offset, "dropping page for a reset feed");
            return Ok(NextPage::AlreadyFetching);
        }
        feed.is_loading = false;
        feed.is_fetching_next = false;

        match result {
            Ok(lookup) => {
                let items = lookup.value.items.clone();
                feed.pages.push(lookup.value);
                if !feed.has_more() {
                    tracing::info!(pages = feed.pages.len(), "reached end of collection");
                }
                Ok(NextPage::Appended { offset, items })
            }
            Err(err) => {
                feed.error = Some(err.clone());
                Err(err.into())
            }
        }
    }

    /// Whether a scroll at `metrics` should trigger the next page.
    ///
    /// True when the end is within the threshold, nothing is in flight, and
    /// more pages exist. A failed feed waits for `retry`.
    pub fn should_fetch_next(&self, metrics: ScrollMetrics) -> bool {
        let feed = self.lock();
        metrics.distance_to_end() <= self.threshold
            && !feed.in_flight()
            && feed.error.is_none()
            && feed.has_more()
    }

    /// React to a scroll signal. `None` when no fetch was needed.
    pub async fn on_scroll(&self, metrics: ScrollMetrics) -> Result<Option<NextPage>, BrowseError> {
        if !self.should_fetch_next(metrics) {
            return Ok(None);
        }
        self.fetch_next_page().await.map(Some)
    }

    /// All fetched items, in fetch order.
    pub fn items(&self) -> Vec<ListItem> {
        self.lock().items()
    }

    /// True until a page without a next reference has loaded.
    pub fn has_more(&self) -> bool {
        self.lock().has_more()
    }

    pub fn pages_loaded(&self) -> usize {
        self.lock().pages.len()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let feed = self.lock();
        FeedSnapshot {
            items: feed.items(),
            pages_loaded: feed.pages.len(),
            has_more: feed.has_more(),
            is_loading: feed.is_loading,
            is_fetching_next: feed.is_fetching_next,
            error: feed.error.clone(),
        }
    }

    /// Drop accumulated pages. Cached pages are kept.
    pub fn reset(&self) {
        let mut feed = self.lock();
        let generation = feed.generation + 1;
        *feed = Feed {
            generation,
            ..Feed::default()
        };
    }
}

impl std::fmt::Debug for IncrementalController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalController")
            .field("page_size", &self.page_size)
            .field("threshold", &self.threshold)
            .field("pages_loaded", &self.pages_loaded())
            .finish()
    }
}
