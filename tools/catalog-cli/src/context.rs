//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use catalog_browse::BrowserSession;
use catalog_core::BrowserConfig;
use catalog_data::{CatalogSource, HttpCatalogClient, InMemoryCatalog};

use crate::config::{CliConfig, CONFIG_NAMES};
use crate::output::Output;

/// Records in the generated offline catalog.
const OFFLINE_RECORDS: u32 = 151;

/// Simulated latency of the offline catalog, so loading states show.
const OFFLINE_LATENCY: Duration = Duration::from_millis(40);

/// Settings given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub page_size: Option<u32>,
    pub offline: bool,
}

/// Execution context for CLI commands.
pub struct Context {
    /// Effective browsing configuration.
    pub config: BrowserConfig,
    /// Output handler.
    pub output: Output,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Working directory.
    pub cwd: PathBuf,
    offline: bool,
}

impl Context {
    /// Load context from config file, then apply overrides.
    pub fn load(config_path: Option<&str>, overrides: Overrides, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (file, config_path) = match config_path {
            Some(path) => (CliConfig::load(path)?, Some(PathBuf::from(path))),
            // Try to find config in current directory or parent directories
            None => match find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            },
        };

        let mut config = file.catalog;
        if let Some(base_url) = overrides.base_url {
            config.base_url = base_url;
        }
        if let Some(page_size) = overrides.page_size {
            config.page_size = page_size;
        }
        config.validate().context("Invalid configuration")?;

        if let Some(ref path) = config_path {
            output.debug(&format!("Using config {}", path.display()));
        }

        Ok(Self {
            config,
            output,
            config_path,
            cwd,
            offline: overrides.offline,
        })
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// The catalog to browse.
    pub fn source(&self) -> Result<Arc<dyn CatalogSource>> {
        if self.offline {
            self.output.debug("Browsing the generated offline catalog");
            return Ok(Arc::new(
                InMemoryCatalog::generated(OFFLINE_RECORDS).with_latency(OFFLINE_LATENCY),
            ));
        }

        let client = HttpCatalogClient::new(&self.config)
            .with_context(|| format!("Failed to create client for {}", self.config.base_url))?;
        Ok(Arc::new(client))
    }

    /// A fresh browsing session over `source()`.
    pub fn session(&self) -> Result<BrowserSession> {
        Ok(BrowserSession::new(self.config.clone(), self.source()?))
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}

/// Find config file in directory tree.
fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_NAMES {
            let config_path = current.join(name);
            if config_path.exists() {
                match CliConfig::load(&config_path) {
                    Ok(config) => return Some((config, config_path)),
                    Err(e) => tracing::warn!(path = %config_path.display(), error = %e, "skipping unreadable config"),
                }
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}
