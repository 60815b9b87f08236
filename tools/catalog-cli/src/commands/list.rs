//! Paginated browsing.

use anyhow::{Context as _, Result};
use catalog_browse::{
    render_boundary, BrowseError, BrowserSession, PageSnapshot, RecordView, Rendered, ViewStatus,
};
use serde_json::json;

use super::{cards_json, load_cards, ListArgs};
use crate::context::Context;
use crate::render;

/// Run the list command.
pub async fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    show_page(&session, args.page, args.retry, ctx).await
}

/// Load and print `page`. Shared with `open`.
pub async fn show_page(session: &BrowserSession, page: u32, retry: bool, ctx: &Context) -> Result<()> {
    let paged = session.paged();

    // The page count is only known once a page has loaded.
    let mut loaded = load(session, retry, ctx).await;
    if page != paged.current_page() && loaded.is_ok() {
        let change = paged.page_change(page).with_context(|| {
            format!("Page {} does not exist (1..={})", page, paged.total_pages())
        })?;
        ctx.output.debug(&format!("Moved from page {} to {}", change.from, change.to));
        loaded = load(session, retry, ctx).await;
    }

    let snapshot = paged.snapshot();
    let status = ViewStatus::from_parts(
        snapshot.is_loading,
        snapshot.error.as_ref(),
        snapshot.items.is_empty(),
    );
    let cards = load_cards(session, &snapshot.items, ctx).await;

    if ctx.output.is_json() {
        ctx.output.json(&page_json(&snapshot, &status, &cards));
    } else {
        match render_boundary(|| render::page(&snapshot, &status, &cards)) {
            Rendered::View(text) => ctx.output.block(&text),
            Rendered::Fallback(fallback) => ctx.output.fallback(&fallback),
        }
    }

    let stats = session.list_stats();
    ctx.output.debug(&format!(
        "list cache: {} hits, {} misses, {} retries",
        stats.hits, stats.misses, stats.retries
    ));

    loaded
        .map(|_| ())
        .with_context(|| format!("Failed to load page {}", paged.current_page()))
}

async fn load(session: &BrowserSession, retry: bool, ctx: &Context) -> Result<(), BrowseError> {
    let paged = session.paged();
    let spinner = ctx
        .output
        .spinner(&format!("Loading page {}", paged.current_page()));
    let mut result = paged.load().await;
    if result.is_err() && retry {
        spinner.set_message(format!("Retrying page {}", paged.current_page()));
        result = paged.retry().await;
    }
    spinner.finish_and_clear();
    result.map(|_| ())
}

fn page_json(snapshot: &PageSnapshot, status: &ViewStatus, cards: &[RecordView]) -> serde_json::Value {
    json!({
        "mode": "paginated",
        "page": snapshot.current_page,
        "page_size": snapshot.page_size,
        "total_pages": snapshot.total_pages,
        "can_go_previous": snapshot.can_go_previous(),
        "can_go_next": snapshot.can_go_next(),
        "pages": snapshot.page_numbers(),
        "items": snapshot.items,
        "cards": cards_json(cards),
        "view": status,
    })
}
