//! Scroll plumbing: position restoration, frame throttling and listeners.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::incremental::ScrollMetrics;
use crate::navigation::{BrowsingMode, BrowsingState, NavigationStore, StatePatch};

/// One animation frame at 60Hz.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// An instruction to move the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollJump {
    pub offset: u32,
    pub animated: bool,
}

/// Restores the incremental view's scroll position on re-entry.
///
/// Entering with a stored offset arms a one-shot guard: scroll write-backs
/// are dropped until the caller reports the jump as done, so the restored
/// offset is not overwritten by the pre-jump position.
#[derive(Debug, Default)]
pub struct ScrollRestoration {
    suppressed: bool,
}

impl ScrollRestoration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call on entry into the browsing view.
    pub fn enter(&mut self, state: &BrowsingState) -> Option<ScrollJump> {
        if state.mode == BrowsingMode::Incremental && state.scroll_offset > 0 {
            self.suppressed = true;
            tracing::debug!(offset = state.scroll_offset, "restoring scroll position");
            Some(ScrollJump {
                offset: state.scroll_offset,
                animated: false,
            })
        } else {
            self.suppressed = false;
            None
        }
    }

    /// The restoring jump has landed; write-backs resume.
    pub fn jump_completed(&mut self) {
        self.suppressed = false;
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Store `offset` unless the guard is armed. Returns whether it was stored.
    pub fn record_scroll(&self, offset: u32, store: &NavigationStore) -> bool {
        if self.suppressed {
            return false;
        }
        store.update(StatePatch::scroll(offset));
        true
    }
}

/// Coalesces high-frequency signals to at most one per frame.
///
/// `signal` keeps only the latest value; `on_frame` hands it out once.
#[derive(Debug)]
pub struct FrameThrottle<T> {
    pending: Option<T>,
    coalesced: u64,
}

impl<T> FrameThrottle<T> {
    pub fn new() -> Self {
        Self {
            pending: None,
            coalesced: 0,
        }
    }

    /// Queue a value for the next frame. Returns false if it replaced one
    /// already waiting.
    pub fn signal(&mut self, value: T) -> bool {
        let fresh = self.pending.replace(value).is_none();
        if !fresh {
            self.coalesced += 1;
        }
        fresh
    }

    /// Take the value for this frame, if any arrived since the last one.
    pub fn on_frame(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Signals dropped in favour of a later one.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

impl<T> Default for FrameThrottle<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A frame clock ticking every `FRAME_INTERVAL`. Late ticks are skipped.
pub fn frame_clock() -> Interval {
    let mut clock = interval(FRAME_INTERVAL);
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
    clock
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<u64, mpsc::UnboundedSender<ScrollMetrics>>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Source of scroll signals with scoped listeners.
#[derive(Clone, Default)]
pub struct ScrollEvents {
    registry: Arc<Mutex<Registry>>,
}

impl ScrollEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It is removed when the subscription drops.
    pub fn subscribe(&self) -> ScrollSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, tx);
        tracing::trace!(id, "scroll listener attached");

        ScrollSubscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver a signal to every listener. Returns how many received it.
    pub fn emit(&self, metrics: ScrollMetrics) -> usize {
        let mut registry = lock(&self.registry);
        registry
            .listeners
            .retain(|_, tx| tx.send(metrics).is_ok());
        registry.listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.registry).listeners.len()
    }
}

impl std::fmt::Debug for ScrollEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// A registered scroll listener. Dropping it unregisters.
#[derive(Debug)]
pub struct ScrollSubscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<ScrollMetrics>,
    registry: Weak<Mutex<Registry>>,
}

impl ScrollSubscription {
    /// Wait for the next signal. `None` once the source is gone.
    pub async fn recv(&mut self) -> Option<ScrollMetrics> {
        self.rx.recv().await
    }

    /// Next queued signal without waiting.
    pub fn try_recv(&mut self) -> Option<ScrollMetrics> {
        self.rx.try_recv().ok()
    }

    /// Drain everything queued and keep only the newest signal.
    pub fn latest(&mut self) -> Option<ScrollMetrics> {
        let mut latest = None;
        while let Ok(metrics) = self.rx.try_recv() {
            latest = Some(metrics);
        }
        latest
    }
}

impl Drop for ScrollSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).listeners.remove(&self.id);
            tracing::trace!(id = self.id, "scroll listener detached");
        }
    }
}
