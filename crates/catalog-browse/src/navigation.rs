//! Session-scoped navigation state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// The two interchangeable ways of browsing the collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowsingMode {
    /// Discrete page navigation.
    #[default]
    Paginated,
    /// Continuous loading while scrolling.
    Incremental,
}

impl BrowsingMode {
    /// The other mode.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Paginated => Self::Incremental,
            Self::Incremental => Self::Paginated,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Paginated => "paginated",
            Self::Incremental => "incremental",
        }
    }
}

impl std::fmt::Display for BrowsingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where the reader is: mode, page and scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowsingState {
    pub mode: BrowsingMode,
    /// Always at least 1.
    pub current_page: u32,
    pub scroll_offset: u32,
}

impl Default for BrowsingState {
    fn default() -> Self {
        Self {
            mode: BrowsingMode::Paginated,
            current_page: 1,
            scroll_offset: 0,
        }
    }
}

impl BrowsingState {
    /// Apply a partial update.
    ///
    /// Fields absent from the patch are left untouched. A mode change resets
    /// the page to 1 (any page in the same patch is ignored) and keeps the
    /// scroll offset.
    pub fn merged(&self, patch: &StatePatch) -> Self {
        let mut next = *self;

        match patch.mode {
            Some(mode) if mode != self.mode => {
                next.mode = mode;
                next.current_page = 1;
            }
            _ => {
                if let Some(page) = patch.page {
                    next.current_page = page.max(1);
                }
            }
        }

        if let Some(scroll) = patch.scroll {
            next.scroll_offset = scroll;
        }

        next
    }
}

/// A partial update to `BrowsingState`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatePatch {
    pub mode: Option<BrowsingMode>,
    pub page: Option<u32>,
    pub scroll: Option<u32>,
}

impl StatePatch {
    /// Patch that only switches mode.
    pub fn mode(mode: BrowsingMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    /// Patch that only moves to a page.
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// Patch that only records a scroll offset.
    pub fn scroll(offset: u32) -> Self {
        Self {
            scroll: Some(offset),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_scroll(mut self, offset: u32) -> Self {
        self.scroll = Some(offset);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.page.is_none() && self.scroll.is_none()
    }
}

/// Owner of the session's `BrowsingState`.
///
/// Clones share the same state. `update` is the only way to change it;
/// readers either take a copy with `get` or watch for changes with
/// `subscribe`.
#[derive(Debug, Clone)]
pub struct NavigationStore {
    tx: Arc<watch::Sender<BrowsingState>>,
}

impl NavigationStore {
    /// Create a store holding the defaults {Paginated, 1, 0}.
    pub fn new() -> Self {
        Self::with_state(BrowsingState::default())
    }

    /// Create a store with an explicit starting state.
    pub fn with_state(state: BrowsingState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx: Arc::new(tx) }
    }

    /// Current state.
    pub fn get(&self) -> BrowsingState {
        *self.tx.borrow()
    }

    /// Merge `patch` into the state and return the result.
    pub fn update(&self, patch: StatePatch) -> BrowsingState {
        if patch.is_empty() {
            return self.get();
        }

        let mut result = BrowsingState::default();
        self.tx.send_modify(|state| {
            let next = state.merged(&patch);
            if next.mode != state.mode {
                tracing::info!(from = %state.mode, to = %next.mode, "browsing mode switched");
            } else if next.current_page != state.current_page {
                tracing::info!(from = state.current_page, to = next.current_page, "page changed");
            }
            *state = next;
            result = next;
        });
        result
    }

    /// Watch for state changes.
    pub fn subscribe(&self) -> watch::Receiver<BrowsingState> {
        self.tx.subscribe()
    }

    /// Back to the defaults.
    pub fn reset(&self) -> BrowsingState {
        let state = BrowsingState::default();
        self.tx.send_replace(state);
        state
    }
}

impl Default for NavigationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let store = NavigationStore::new();
        assert_eq!(
            store.get(),
            BrowsingState {
                mode: BrowsingMode::Paginated,
                current_page: 1,
                scroll_offset: 0,
            }
        );
    }

    #[test]
    fn test_partial_update_leaves_other_fields() {
        let store = NavigationStore::new();
        store.update(StatePatch::page(4));
        store.update(StatePatch::scroll(900));

        let state = store.get();
        assert_eq!(state.current_page, 4);
        assert_eq!(state.scroll_offset, 900);
        assert_eq!(state.mode, BrowsingMode::Paginated);
    }

    #[test]
    fn test_mode_switch_resets_page_keeps_scroll() {
        let store = NavigationStore::with_state(BrowsingState {
            mode: BrowsingMode::Incremental,
            current_page: 7,
            scroll_offset: 1_250,
        });

        let state = store.update(StatePatch::mode(BrowsingMode::Paginated));
        assert_eq!(state.mode, BrowsingMode::Paginated);
        assert_eq!(state.current_page, 1);
        assert_eq!(state.scroll_offset, 1_250);
    }

    #[test]
    fn test_mode_switch_ignores_page_in_same_patch() {
        let store = NavigationStore::new();
        let state = store.update(StatePatch::mode(BrowsingMode::Incremental).with_page(5));
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn test_same_mode_does_not_reset_page() {
        let store = NavigationStore::new();
        store.update(StatePatch::page(3));
        let state = store.update(StatePatch::mode(BrowsingMode::Paginated));
        assert_eq!(state.current_page, 3);
    }

    #[test]
    fn test_page_never_below_one() {
        let store = NavigationStore::new();
        assert_eq!(store.update(StatePatch::page(0)).current_page, 1);
    }

    #[test]
    fn test_clones_share_state() {
        let store = NavigationStore::new();
        let other = store.clone();
        other.update(StatePatch::page(9));
        assert_eq!(store.get().current_page, 9);
    }

    #[test]
    fn test_subscribe_sees_updates() {
        let store = NavigationStore::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.update(StatePatch::scroll(40));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().scroll_offset, 40);
    }

    #[test]
    fn test_reset() {
        let store = NavigationStore::new();
        store.update(StatePatch::mode(BrowsingMode::Incremental).with_scroll(10));
        assert_eq!(store.reset(), BrowsingState::default());
        assert_eq!(store.get(), BrowsingState::default());
    }

    #[test]
    fn test_toggled() {
        assert_eq!(BrowsingMode::Paginated.toggled(), BrowsingMode::Incremental);
        assert_eq!(BrowsingMode::Incremental.to_string(), "incremental");
    }
}
