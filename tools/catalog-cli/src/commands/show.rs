//! Record detail view.

use anyhow::{Context as _, Result};
use catalog_browse::{render_boundary, BrowserSession, Rendered, ViewStatus};

use super::ShowArgs;
use crate::context::Context;
use crate::render;

/// Run the show command.
pub async fn run(args: ShowArgs, ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    show_record(&session, &args.id, args.retry, ctx).await
}

/// Load and print one record. Shared with `open`.
pub async fn show_record(session: &BrowserSession, id: &str, retry: bool, ctx: &Context) -> Result<()> {
    let records = session.records();

    let spinner = ctx.output.spinner(&format!("Loading {}", id));
    let mut result = records.load(id).await;
    if result.is_err() && retry {
        spinner.set_message(format!("Retrying {}", id));
        result = records.retry(id).await;
    }
    spinner.finish_and_clear();

    let view = records.state(id);
    let status = ViewStatus::from_parts(view.is_loading, view.error.as_ref(), view.record.is_none());

    match (&result, ctx.output.is_json()) {
        (Ok(record), true) => ctx.output.json(record),
        (Err(_), true) => ctx.output.json(&status),
        (Ok(record), false) => match render_boundary(|| render::record(record)) {
            Rendered::View(text) => ctx.output.block(&text),
            Rendered::Fallback(fallback) => ctx.output.fallback(&fallback),
        },
        (Err(_), false) => {
            let hint = if view.is_not_found() {
                "Check the id or name and try again."
            } else {
                "Retry with --retry."
            };
            ctx.output.block(&render::failure(&status, hint));
        }
    }

    result
        .map(|_| ())
        .with_context(|| format!("Failed to load record {}", id))
}
