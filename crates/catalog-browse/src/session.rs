//! One browsing session wired from configuration.

use std::sync::Arc;

use catalog_cache::{CachePolicy, CacheStats, ResultCache};
use catalog_core::{BrowserConfig, CatalogPage, Record};
use catalog_data::{CatalogSource, RetryPolicy};

use crate::incremental::IncrementalController;
use crate::navigation::{BrowsingMode, BrowsingState, NavigationStore, StatePatch};
use crate::paged::PageController;
use crate::record::RecordLoader;

/// Owns the navigation state, both caches and the controllers reading them.
///
/// Both browsing modes share one list cache, so a page fetched in one mode
/// is reused by the other when page size and offset match.
pub struct BrowserSession {
    config: BrowserConfig,
    nav: NavigationStore,
    list_cache: ResultCache<CatalogPage>,
    record_cache: ResultCache<Record>,
    paged: PageController,
    incremental: IncrementalController,
    records: RecordLoader,
}

impl BrowserSession {
    pub fn new(config: BrowserConfig, source: Arc<dyn CatalogSource>) -> Self {
        let retry = RetryPolicy::from_config(&config);
        let list_cache = ResultCache::new(
            CachePolicy::list()
                .with_stale_time(config.list_stale_time())
                .with_retry(retry.clone())
                .with_capacity(config.cache_capacity),
        );
        let record_cache = ResultCache::new(
            CachePolicy::record()
                .with_stale_time(config.record_stale_time())
                .with_retry(retry)
                .with_capacity(config.cache_capacity),
        );

        let nav = NavigationStore::new();
        let paged = PageController::new(
            Arc::clone(&source),
            list_cache.clone(),
            nav.clone(),
            config.page_size,
        );
        let incremental =
            IncrementalController::new(Arc::clone(&source), list_cache.clone(), config.page_size)
                .with_threshold(config.scroll_threshold);
        let records = RecordLoader::new(source, record_cache.clone());

        tracing::debug!(
            page_size = config.page_size,
            collection = %config.collection,
            "browser session created"
        );

        Self {
            config,
            nav,
            list_cache,
            record_cache,
            paged,
            incremental,
            records,
        }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    pub fn navigation(&self) -> &NavigationStore {
        &self.nav
    }

    pub fn state(&self) -> BrowsingState {
        self.nav.get()
    }

    pub fn mode(&self) -> BrowsingMode {
        self.nav.get().mode
    }

    /// Switch browsing mode. Switching to the current mode is a no-op.
    pub fn set_mode(&self, mode: BrowsingMode) -> BrowsingState {
        self.nav.update(StatePatch::mode(mode))
    }

    pub fn paged(&self) -> &PageController {
        &self.paged
    }

    pub fn incremental(&self) -> &IncrementalController {
        &self.incremental
    }

    pub fn records(&self) -> &RecordLoader {
        &self.records
    }

    pub fn list_stats(&self) -> CacheStats {
        self.list_cache.stats()
    }

    pub fn record_stats(&self) -> CacheStats {
        self.record_cache.stats()
    }
}

impl std::fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSession")
            .field("state", &self.nav.get())
            .field("page_size", &self.config.page_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_data::InMemoryCatalog;

    fn session(count: u32, page_size: u32) -> (Arc<InMemoryCatalog>, BrowserSession) {
        let catalog = Arc::new(InMemoryCatalog::generated(count));
        let source: Arc<dyn CatalogSource> = catalog.clone();
        let config = BrowserConfig::default().with_page_size(page_size);
        (catalog, BrowserSession::new(config, source))
    }

    #[tokio::test(start_paused = true)]
    async fn test_modes_share_list_cache() {
        let (catalog, session) = session(100, 20);

        session.paged().load().await.unwrap();
        assert_eq!(catalog.list_calls(), 1);

        session.set_mode(BrowsingMode::Incremental);
        let items = session.incremental().load_initial().await.unwrap();
        assert_eq!(items.len(), 20);
        assert_eq!(catalog.list_calls(), 1);

        session.incremental().fetch_next_page().await.unwrap();
        session.set_mode(BrowsingMode::Paginated);
        session.paged().page_change(2).unwrap();
        session.paged().load().await.unwrap();
        assert_eq!(catalog.list_calls(), 2);
        assert_eq!(session.list_stats().hits, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_switch_resets_page() {
        let (_catalog, session) = session(100, 20);
        session.paged().load().await.unwrap();
        session.paged().page_change(3).unwrap();
        session.navigation().update(StatePatch::scroll(640));

        let state = session.set_mode(BrowsingMode::Incremental);
        assert_eq!(state.current_page, 1);
        assert_eq!(state.scroll_offset, 640);
        assert_eq!(session.mode(), BrowsingMode::Incremental);
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_flows_into_controllers() {
        let catalog = Arc::new(InMemoryCatalog::generated(10));
        let source: Arc<dyn CatalogSource> = catalog.clone();
        let config = BrowserConfig {
            scroll_threshold: 75,
            ..BrowserConfig::default().with_page_size(4)
        };
        let session = BrowserSession::new(config, source);

        assert_eq!(session.paged().page_size(), 4);
        assert_eq!(session.incremental().threshold(), 75);

        session.paged().load().await.unwrap();
        assert_eq!(session.paged().total_pages(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_cache_is_separate() {
        let (catalog, session) = session(10, 20);
        session.records().load("4").await.unwrap();
        session.records().load("4").await.unwrap();

        assert_eq!(catalog.record_calls(), 1);
        assert_eq!(session.record_stats().hits, 1);
        assert_eq!(session.list_stats().hits, 0);
    }
}
