//! Incremental browsing over a simulated viewport.

use anyhow::{Context as _, Result};
use catalog_browse::{
    frame_clock, render_boundary, BrowseError, BrowserSession, BrowsingMode, FeedSnapshot, FrameThrottle,
    NextPage, RecordView, Rendered, ScrollEvents, ScrollMetrics, ScrollRestoration, StatePatch,
    ViewStatus,
};
use serde_json::json;

use super::{cards_json, load_cards, ScrollArgs};
use crate::context::Context;
use crate::render;

/// Scroll signals emitted between two frames.
const SIGNALS_PER_FRAME: u32 = 4;

/// Run the scroll command.
pub async fn run(args: ScrollArgs, ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let nav = session.navigation();
    session.set_mode(BrowsingMode::Incremental);
    if args.from > 0 {
        nav.update(StatePatch::scroll(args.from));
    }

    let feed = session.incremental();
    let spinner = ctx.output.spinner("Loading first page");
    let mut loaded = feed.load_initial().await.map(|_| ());
    if loaded.is_err() && args.retry {
        spinner.set_message("Retrying first page");
        loaded = feed.retry().await.map(|_| ());
    }
    spinner.finish_and_clear();

    let mut restoration = ScrollRestoration::new();
    let start = match restoration.enter(&nav.get()) {
        Some(jump) => {
            ctx.output.debug(&format!("Restoring scroll offset {}", jump.offset));
            jump.offset
        }
        None => 0,
    };
    // The viewport still reports the top until the jump lands.
    restoration.record_scroll(0, nav);
    restoration.jump_completed();

    let mut coalesced = 0;
    if loaded.is_ok() {
        let (result, dropped) = scroll(&args, start, &mut restoration, ctx, &session).await;
        loaded = result;
        coalesced = dropped;
    }

    let snapshot = feed.snapshot();
    let status = ViewStatus::from_parts(
        snapshot.is_loading,
        snapshot.error.as_ref(),
        snapshot.items.is_empty(),
    );
    let offset = nav.get().scroll_offset;
    let cards = load_cards(&session, &snapshot.items, ctx).await;

    if ctx.output.is_json() {
        ctx.output.json(&feed_json(&snapshot, &status, offset, &cards));
    } else {
        match render_boundary(|| render::feed(&snapshot, &status, &cards)) {
            Rendered::View(text) => ctx.output.block(&text),
            Rendered::Fallback(fallback) => ctx.output.fallback(&fallback),
        }
    }

    ctx.output.debug(&format!(
        "scroll offset {}, {} signals coalesced",
        offset, coalesced
    ));
    loaded.context("Failed to load items")
}

/// Scroll from `start` for the requested number of screens. Returns the
/// outcome and how many signals the frame throttle dropped.
async fn scroll(
    args: &ScrollArgs,
    start: u32,
    restoration: &mut ScrollRestoration,
    ctx: &Context,
    session: &BrowserSession,
) -> (Result<(), BrowseError>, u64) {
    let feed = session.incremental();
    let events = ScrollEvents::new();
    let mut listener = events.subscribe();
    let mut throttle = FrameThrottle::new();
    let mut clock = frame_clock();

    let step = (args.viewport / SIGNALS_PER_FRAME).max(1);
    let target = start.saturating_add(args.screens.saturating_mul(args.viewport));
    let mut position = start;
    let mut shown = 0;

    let spinner = ctx.output.spinner("Scrolling");
    let outcome = loop {
        let content = (feed.items().len() as u32).saturating_mul(args.row_height);
        let max_top = content.saturating_sub(args.viewport);
        let before = position.min(max_top);
        let reached = position >= target && before >= target;
        let exhausted = before >= max_top && !feed.has_more();
        if reached || exhausted {
            break Ok(());
        }

        for _ in 0..SIGNALS_PER_FRAME {
            position = position.saturating_add(step).min(target);
            events.emit(ScrollMetrics::new(position.min(max_top), args.viewport, content));
            if let Some(metrics) = listener.latest() {
                throttle.signal(metrics);
            }
        }

        clock.tick().await;
        let Some(metrics) = throttle.on_frame() else {
            continue;
        };
        restoration.record_scroll(metrics.scroll_top, session.navigation());
        if metrics.scroll_top != shown {
            shown = metrics.scroll_top;
            spinner.set_message(format!("Scrolled to {}", shown));
        }

        let appended = match feed.on_scroll(metrics).await {
            Ok(Some(NextPage::Appended { offset, items })) => {
                ctx.output.debug(&format!("Loaded {} items at offset {}", items.len(), offset));
                true
            }
            Ok(_) => false,
            Err(e) if args.retry => match feed.retry().await {
                Ok(_) => true,
                Err(_) => break Err(e),
            },
            Err(e) => break Err(e),
        };

        if !appended && metrics.scroll_top == before {
            break Ok(());
        }
    };
    spinner.finish_and_clear();

    (outcome, throttle.coalesced())
}

fn feed_json(
    snapshot: &FeedSnapshot,
    status: &ViewStatus,
    scroll_offset: u32,
    cards: &[RecordView],
) -> serde_json::Value {
    json!({
        "mode": "incremental",
        "pages_loaded": snapshot.pages_loaded,
        "has_more": snapshot.has_more,
        "scroll_offset": scroll_offset,
        "items": snapshot.items,
        "cards": cards_json(cards),
        "view": status,
    })
}
