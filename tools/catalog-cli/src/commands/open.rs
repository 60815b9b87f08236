//! Navigation by path.

use anyhow::Result;
use catalog_browse::Route;
use serde_json::json;

use super::OpenArgs;
use super::{list, show};
use crate::context::Context;
use crate::render;

/// Run the open command.
pub async fn run(args: OpenArgs, ctx: &Context) -> Result<()> {
    let route = Route::parse(&args.path, &ctx.config.collection);
    ctx.output.debug(&format!("{} resolved to {:?}", args.path, route));

    match route {
        Route::Home => {
            let session = ctx.session()?;
            list::show_page(&session, 1, false, ctx).await
        }
        Route::Record(id) => {
            let session = ctx.session()?;
            show::show_record(&session, &id, false, ctx).await
        }
        Route::NotFound(path) => {
            if ctx.output.is_json() {
                ctx.output.json(&json!({ "route": "not_found", "path": path }));
            } else {
                ctx.output.block(&render::not_found(&path));
            }
            Ok(())
        }
    }
}
