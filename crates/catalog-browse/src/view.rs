//! What a view should show, derived from loading and error state.

use catalog_data::FetchError;
use serde::Serialize;

/// Render decision for a list or detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewStatus {
    /// Nothing to show yet.
    Loading,
    /// Show the message with a retry action.
    Failed {
        message: String,
        retryable: bool,
        not_found: bool,
    },
    /// Loaded, but no items.
    Empty,
    Ready,
}

impl ViewStatus {
    /// Data already on screen wins over an error from a background refresh.
    pub fn from_parts(is_loading: bool, error: Option<&FetchError>, is_empty: bool) -> Self {
        if is_loading {
            return Self::Loading;
        }
        match error {
            Some(err) if is_empty => Self::Failed {
                message: failure_message(err),
                retryable: true,
                not_found: err.is_not_found(),
            },
            _ if is_empty => Self::Empty,
            _ => Self::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

fn failure_message(err: &FetchError) -> String {
    if err.is_not_found() {
        "Nothing was found at this address.".to_string()
    } else if err.is_transient() {
        format!("The catalog could not be reached ({}).", err)
    } else {
        format!("Something went wrong loading this view ({}).", err)
    }
}
