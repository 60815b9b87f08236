//! Configuration management commands.

use anyhow::{bail, Context as _, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, is_json, CliConfig};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { path, force } => init_config(&path, force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.info(&format!("Loaded from {}", path.display())),
        None => ctx.output.info("No config file found, using defaults"),
    }
    if ctx.is_offline() {
        ctx.output.info("Offline: browsing the generated catalog");
    }

    let config = &ctx.config;
    ctx.output.kv("base_url", &config.base_url);
    ctx.output.kv("collection", &config.collection);
    ctx.output.kv("page_size", &config.page_size.to_string());
    ctx.output.kv("list_stale_secs", &config.list_stale_secs.to_string());
    ctx.output.kv("record_stale_secs", &config.record_stale_secs.to_string());
    ctx.output.kv("max_retries", &config.max_retries.to_string());
    ctx.output.kv(
        "backoff",
        &format!("{}ms .. {}ms", config.backoff_base_ms, config.backoff_max_ms),
    );
    ctx.output.kv("cache_capacity", &config.cache_capacity.to_string());
    ctx.output.kv("scroll_threshold", &config.scroll_threshold.to_string());
    ctx.output.kv("request_timeout_ms", &config.request_timeout_ms.to_string());
    Ok(())
}

fn init_config(path: &str, force: bool, ctx: &Context) -> Result<()> {
    let target = ctx.resolve_path(path);
    if target.exists() && !force {
        bail!(
            "Config file already exists: {} (use --force to overwrite)",
            target.display()
        );
    }

    if is_json(&target) {
        CliConfig::default().save(&target)?;
    } else {
        std::fs::write(&target, generate_default_config())
            .with_context(|| format!("Failed to write config file: {}", target.display()))?;
    }

    ctx.output.success(&format!("Created {}", target.display()));
    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    let Some(path) = &ctx.config_path else {
        ctx.output.warn("No config file found; defaults are always valid");
        return Ok(());
    };

    let config = CliConfig::load(path)?;
    config
        .catalog
        .validate()
        .with_context(|| format!("{} is invalid", path.display()))?;
    ctx.output.success(&format!("{} is valid", path.display()));
    Ok(())
}
