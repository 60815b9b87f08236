//! Cache key composition.

use serde::{Deserialize, Serialize};

/// A cache key structurally derived from request parameters.
///
/// List pages are keyed by their full request shape, so a page fetched in
/// one browsing mode is reused by the other whenever page size and offset
/// coincide, and a page-size change never reuses pages of another size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CacheKey {
    /// One page of the collection listing.
    List { limit: u32, offset: u32 },
    /// One record, by normalized id or name.
    Record { id: String },
}

impl CacheKey {
    /// Key for a listing page.
    pub fn list(limit: u32, offset: u32) -> Self {
        Self::List { limit, offset }
    }

    /// Key for a record. Names are case-insensitive upstream.
    pub fn record(id: impl AsRef<str>) -> Self {
        Self::Record {
            id: id.as_ref().trim().to_lowercase(),
        }
    }

    /// Short name of the request kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::List { .. } => "list",
            Self::Record { .. } => "record",
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List { limit, offset } => write!(f, "list:{}:{}", limit, offset),
            Self::Record { id } => write!(f, "record:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(CacheKey::list(20, 40).to_string(), "list:20:40");
        assert_eq!(CacheKey::record("25").to_string(), "record:25");
    }

    #[test]
    fn test_record_key_normalized() {
        assert_eq!(CacheKey::record(" Pikachu "), CacheKey::record("pikachu"));
    }

    #[test]
    fn test_page_size_is_part_of_key() {
        assert_ne!(CacheKey::list(20, 0), CacheKey::list(50, 0));
    }

    #[test]
    fn test_kind() {
        assert_eq!(CacheKey::list(1, 0).kind(), "list");
        assert_eq!(CacheKey::record("x").kind(), "record");
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&CacheKey::list(20, 0)).unwrap();
        assert_eq!(json, r#"{"kind":"list","limit":20,"offset":0}"#);
    }
}
