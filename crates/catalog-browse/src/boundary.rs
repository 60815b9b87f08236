//! Top-level fallback for rendering defects.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;

/// Message shown when a view cannot be rendered.
pub const FALLBACK_MESSAGE: &str = "Something went wrong while showing this page.";

/// Defects a renderer can report instead of producing output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// A value the view depends on was absent.
    #[error("missing {0}")]
    Missing(String),

    /// Data did not have the expected shape.
    #[error("unexpected shape: {0}")]
    Shape(String),

    /// Writing the output failed.
    #[error("output failed: {0}")]
    Output(String),
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl From<std::fmt::Error> for RenderError {
    fn from(err: std::fmt::Error) -> Self {
        Self::Output(err.to_string())
    }
}

/// The recovery action offered by a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Recovery {
    /// Start the view again from scratch.
    Reload,
}

/// Replacement for a view that failed to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fallback {
    pub message: String,
    /// What actually failed, for logs and `--verbose` output.
    pub detail: String,
    pub recovery: Recovery,
}

impl Fallback {
    fn new(detail: impl Into<String>) -> Self {
        Self {
            message: FALLBACK_MESSAGE.to_string(),
            detail: detail.into(),
            recovery: Recovery::Reload,
        }
    }
}

/// Output of a render made through the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    View(T),
    Fallback(Fallback),
}

impl<T> Rendered<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    pub fn view(self) -> Option<T> {
        match self {
            Self::View(view) => Some(view),
            Self::Fallback(_) => None,
        }
    }
}

/// Run `render`, replacing any error or panic with a generic fallback.
///
/// Expected failures such as fetch errors are rendered by the views
/// themselves; only defects should reach this point.
pub fn render_boundary<T, F>(render: F) -> Rendered<T>
where
    F: FnOnce() -> Result<T, RenderError>,
{
    match catch_unwind(AssertUnwindSafe(render)) {
        Ok(Ok(view)) => Rendered::View(view),
        Ok(Err(err)) => {
            tracing::error!(error = %err, "render failed");
            Rendered::Fallback(Fallback::new(err.to_string()))
        }
        Err(payload) => {
            let detail = panic_message(payload.as_ref());
            tracing::error!(panic = %detail, "render panicked");
            Rendered::Fallback(Fallback::new(detail))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
