//! Browse error types.

use catalog_data::FetchError;

/// Errors surfaced by the browsing controllers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrowseError {
    /// Navigation outside `1..=total_pages`.
    #[error("page {page} is outside 1..={total_pages}")]
    PageOutOfRange { page: u32, total_pages: u32 },

    /// The upstream fetch failed after retries.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl BrowseError {
    /// The underlying fetch failure, if any.
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            Self::Fetch(err) => Some(err),
            _ => None,
        }
    }
}
