//! Core data model and configuration for the catalog browser.
//!
//! This crate provides the fundamental types shared by every layer:
//! - `CatalogPage` / `ListItem` - One page of a collection listing
//! - `Record` - Full detail for a single catalog entry
//! - `BrowserConfig` - Page size, staleness windows, retry and endpoint settings

mod config;
mod model;

pub use config::*;
pub use model::*;
