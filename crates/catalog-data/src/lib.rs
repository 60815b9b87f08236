//! Data access layer for the upstream catalog service.
//!
//! This crate provides:
//! - `CatalogSource` - The two read operations the browser needs
//! - `HttpCatalogClient` - `reqwest` implementation against the live API
//! - `InMemoryCatalog` - Deterministic source for tests and offline use
//! - `RetryPolicy` - Retry conditions and backoff strategies
//! - `TimeoutConfig` - Per-request timeouts

mod client;
mod memory;
mod retry;
mod timeout;
mod wire;

pub use client::*;
pub use memory::*;
pub use retry::*;
pub use timeout::*;
pub use wire::*;
