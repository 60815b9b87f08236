//! Observability for the catalog browser.
//!
//! This crate provides:
//! - `LogLevel` / `LogFormat` - Verbosity and output shape
//! - `init_logging` - Installs the global `tracing` subscriber (stderr)

mod logging;

pub use logging::*;
