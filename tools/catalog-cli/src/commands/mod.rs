//! CLI command implementations.

pub mod config;
pub mod list;
pub mod open;
pub mod scroll;
pub mod show;

use catalog_browse::{BrowserSession, RecordView};
use catalog_core::ListItem;
use clap::{Args, Subcommand};
use serde_json::json;

use crate::context::Context;

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Page to show (1-based).
    #[arg(short, long, default_value = "1")]
    pub page: u32,

    /// Retry once more if the page fails after automatic retries.
    #[arg(long)]
    pub retry: bool,
}

/// Arguments for the scroll command.
#[derive(Args)]
pub struct ScrollArgs {
    /// How many viewport heights to scroll.
    #[arg(short, long, default_value = "5")]
    pub screens: u32,

    /// Viewport height.
    #[arg(long, default_value = "600")]
    pub viewport: u32,

    /// Height of one row.
    #[arg(long, default_value = "48")]
    pub row_height: u32,

    /// Scroll offset to restore before scrolling further.
    #[arg(long, default_value = "0")]
    pub from: u32,

    /// Retry once more if a page fails after automatic retries.
    #[arg(long)]
    pub retry: bool,
}

/// Arguments for the show command.
#[derive(Args)]
pub struct ShowArgs {
    /// Record id or name.
    pub id: String,

    /// Retry once more if the record fails after automatic retries.
    #[arg(long)]
    pub retry: bool,
}

/// Arguments for the open command.
#[derive(Args)]
pub struct OpenArgs {
    /// Path such as `/` or `/pokemon/25`.
    pub path: String,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
    /// Write a default config file.
    Init {
        /// Where to write it.
        #[arg(default_value = "catalog.toml")]
        path: String,

        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}

/// Fetch the record behind every listed item and return the card states.
pub(crate) async fn load_cards(session: &BrowserSession, items: &[ListItem], ctx: &Context) -> Vec<RecordView> {
    if items.is_empty() {
        return Vec::new();
    }

    let records = session.records();
    let spinner = ctx.output.spinner(&format!("Loading {} cards", items.len()));
    let failed = records
        .load_cards(items)
        .await
        .iter()
        .filter(|card| card.is_err())
        .count();
    spinner.finish_and_clear();

    if failed > 0 {
        ctx.output.debug(&format!("{} cards without details", failed));
    }
    records.cards(items)
}

pub(crate) fn cards_json(cards: &[RecordView]) -> Vec<serde_json::Value> {
    cards
        .iter()
        .map(|card| {
            json!({
                "id": card.id,
                "types": card.record.as_ref().map(|record| &record.category_tags),
                "error": card.error.as_ref().map(ToString::to_string),
            })
        })
        .collect()
}
