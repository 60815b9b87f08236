//! Discrete page navigation.

use std::sync::{Arc, Mutex, PoisonError};

use catalog_cache::{CacheKey, ResultCache};
use catalog_core::{CatalogPage, ListItem};
use catalog_data::{CatalogSource, FetchError};
use serde::Serialize;

use crate::error::BrowseError;
use crate::fetch;
use crate::navigation::{NavigationStore, StatePatch};

/// Width of the page-number window.
const WINDOW: u32 = 5;

/// Number of pages needed to show `total_count` items. Zero when
/// `page_size` is zero.
pub fn total_pages(total_count: u32, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(page_size)
}

/// Offset of the first item on a 1-based page.
pub fn page_offset(page: u32, page_size: u32) -> u32 {
    page.saturating_sub(1).saturating_mul(page_size)
}

/// One entry in the page-number strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    Number(u32),
    Ellipsis,
}

impl Serialize for PageSlot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_u32(*n),
            Self::Ellipsis => serializer.serialize_str("…"),
        }
    }
}

impl std::fmt::Display for PageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Ellipsis => write!(f, "…"),
        }
    }
}

/// Page numbers to display for `current` out of `total`.
///
/// Up to five pages are shown in full. Beyond that a window of five starts at
/// `current - 2` (never below 1, never past `total`), with `1 …` in front when
/// the window starts after page 2 and `… total` behind when it ends before
/// `total - 1`.
pub fn page_numbers(current: u32, total: u32) -> Vec<PageSlot> {
    if total <= WINDOW {
        return (1..=total).map(PageSlot::Number).collect();
    }

    let start = current.saturating_sub(2).max(1);
    let end = (start + WINDOW - 1).min(total);

    let mut slots = Vec::with_capacity(WINDOW as usize + 4);
    if start > 2 {
        slots.push(PageSlot::Number(1));
        slots.push(PageSlot::Ellipsis);
    }
    slots.extend((start..=end).map(PageSlot::Number));
    if end < total - 1 {
        slots.push(PageSlot::Ellipsis);
        slots.push(PageSlot::Number(total));
    }
    slots
}

/// Signal returned by a successful page change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageChange {
    pub from: u32,
    pub to: u32,
    /// The caller should scroll the view back to the top.
    pub scroll_to_top: bool,
}

/// Everything a paginated view needs to render.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub current_page: u32,
    pub page_size: u32,
    pub items: Vec<ListItem>,
    /// Zero until a page has loaded.
    pub total_pages: u32,
    pub is_loading: bool,
    pub is_fetching: bool,
    pub error: Option<FetchError>,
}

impl PageSnapshot {
    pub fn can_go_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn page_numbers(&self) -> Vec<PageSlot> {
        page_numbers(self.current_page, self.total_pages)
    }
}

/// Drives paginated browsing.
///
/// The current page lives in the shared `NavigationStore`; this controller
/// turns it into a list request and remembers the collection size so the
/// page strip stays stable while the next page loads.
pub struct PageController {
    source: Arc<dyn CatalogSource>,
    pages: ResultCache<CatalogPage>,
    nav: NavigationStore,
    page_size: u32,
    known_total: Mutex<Option<u32>>,
}

impl PageController {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        pages: ResultCache<CatalogPage>,
        nav: NavigationStore,
        page_size: u32,
    ) -> Self {
        Self {
            source,
            pages,
            nav,
            page_size,
            known_total: Mutex::new(None),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn current_page(&self) -> u32 {
        self.nav.get().current_page
    }

    fn key_for(&self, page: u32) -> CacheKey {
        CacheKey::list(self.page_size, page_offset(page, self.page_size))
    }

    fn remember_total(&self, total_count: u32) {
        *self.known_total.lock().unwrap_or_else(PoisonError::into_inner) = Some(total_count);
    }

    /// Load the current page through the cache.
    pub async fn load(&self) -> Result<CatalogPage, BrowseError> {
        let page = self.current_page();
        let offset = page_offset(page, self.page_size);
        tracing::debug!(page, offset, limit = self.page_size, "loading page");

        let lookup = self
            .pages
            .get(
                self.key_for(page),
                fetch::list_page(&self.source, self.page_size, offset),
            )
            .await?;
        self.remember_total(lookup.value.total_count);
        Ok(lookup.value)
    }

    /// Retry the current page after it failed.
    pub async fn retry(&self) -> Result<CatalogPage, BrowseError> {
        let page = self.current_page();
        let offset = page_offset(page, self.page_size);
        let lookup = self
            .pages
            .retry(
                self.key_for(page),
                fetch::list_page(&self.source, self.page_size, offset),
            )
            .await?;
        self.remember_total(lookup.value.total_count);
        Ok(lookup.value)
    }

    /// Total pages from the current page's data, falling back to the last
    /// size seen. Zero if nothing has loaded.
    pub fn total_pages(&self) -> u32 {
        let total_count = self
            .pages
            .peek(&self.key_for(self.current_page()))
            .map(|page| page.total_count)
            .or(*self.known_total.lock().unwrap_or_else(PoisonError::into_inner));
        total_count
            .map(|count| total_pages(count, self.page_size))
            .unwrap_or(0)
    }

    pub fn can_go_previous(&self) -> bool {
        self.current_page() > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page() < self.total_pages()
    }

    pub fn page_numbers(&self) -> Vec<PageSlot> {
        page_numbers(self.current_page(), self.total_pages())
    }

    /// Move to `new_page`. Rejected outside `1..=total_pages`.
    pub fn page_change(&self, new_page: u32) -> Result<PageChange, BrowseError> {
        let total_pages = self.total_pages();
        if new_page < 1 || new_page > total_pages {
            tracing::debug!(page = new_page, total_pages, "page change rejected");
            return Err(BrowseError::PageOutOfRange {
                page: new_page,
                total_pages,
            });
        }

        let from = self.current_page();
        let state = self.nav.update(StatePatch::page(new_page));
        Ok(PageChange {
            from,
            to: state.current_page,
            scroll_to_top: true,
        })
    }

    pub fn previous(&self) -> Result<PageChange, BrowseError> {
        self.page_change(self.current_page().saturating_sub(1))
    }

    pub fn next(&self) -> Result<PageChange, BrowseError> {
        self.page_change(self.current_page().saturating_add(1))
    }

    pub fn snapshot(&self) -> PageSnapshot {
        let current_page = self.current_page();
        let state = self.pages.state(&self.key_for(current_page));
        PageSnapshot {
            current_page,
            page_size: self.page_size,
            items: state.data.map(|page| page.items).unwrap_or_default(),
            total_pages: self.total_pages(),
            is_loading: state.is_loading,
            is_fetching: state.is_fetching,
            error: state.error,
        }
    }
}

impl std::fmt::Debug for PageController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageController")
            .field("page_size", &self.page_size)
            .field("current_page", &self.current_page())
            .finish()
    }
}
