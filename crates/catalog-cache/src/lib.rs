//! Result cache for catalog fetches.
//!
//! This crate provides:
//! - `ResultCache` - Memoized fetches with single flight per key
//! - `CacheKey` - Keys derived from request parameters
//! - `CachePolicy` / `StaleClass` - Staleness windows, retry and capacity
//! - `QueryState` - Observable per-key state for loading/error rendering

mod cache;
mod key;
mod policy;
mod state;

pub use cache::*;
pub use key::*;
pub use policy::*;
pub use state::*;
