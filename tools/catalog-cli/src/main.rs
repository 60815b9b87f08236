//! Catalog CLI - Terminal browser for a paginated read-only catalog.
//!
//! Commands:
//! - `catalog list` - Browse one page at a time
//! - `catalog scroll` - Browse by scrolling a simulated viewport
//! - `catalog show` - Show one record
//! - `catalog open` - Resolve a navigation path
//! - `catalog config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;
mod render;

use anyhow::Result;
use catalog_observability::{init_logging, LogFormat, LogLevel};
use clap::{ArgAction, Parser, Subcommand};

use commands::{ConfigArgs, ListArgs, OpenArgs, ScrollArgs, ShowArgs};
use context::Overrides;

/// Catalog CLI - Browse a paginated read-only catalog
#[derive(Parser)]
#[command(name = "catalog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Catalog service base URL
    #[arg(long, global = true, env = "CATALOG_BASE_URL")]
    base_url: Option<String>,

    /// Items per page
    #[arg(long, global = true, env = "CATALOG_PAGE_SIZE")]
    page_size: Option<u32>,

    /// Browse a generated in-memory catalog instead of the network
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the collection one page at a time
    List(ListArgs),

    /// Browse the collection by scrolling
    Scroll(ScrollArgs),

    /// Show one record
    Show(ShowArgs),

    /// Open a navigation path such as /pokemon/25
    Open(OpenArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.json { LogFormat::Json } else { LogFormat::Human };
    if let Err(e) = init_logging(LogLevel::from_verbosity(cli.verbose), format) {
        eprintln!("logging disabled: {}", e);
    }

    // Setup output formatting
    let output = output::Output::new(cli.verbose > 0, cli.json);

    let overrides = Overrides {
        base_url: cli.base_url,
        page_size: cli.page_size,
        offline: cli.offline,
    };
    let ctx = match context::Context::load(cli.config.as_deref(), overrides, output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::List(args) => commands::list::run(args, &ctx).await,
        Commands::Scroll(args) => commands::scroll::run(args, &ctx).await,
        Commands::Show(args) => commands::show::run(args, &ctx).await,
        Commands::Open(args) => commands::open::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
