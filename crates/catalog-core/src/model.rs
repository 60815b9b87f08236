//! Catalog data model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One entry in a collection listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListItem {
    /// Record name.
    pub name: String,
    /// Reference to the record's detail resource (a URL upstream).
    pub detail_ref: String,
}

impl ListItem {
    /// Create a new list item.
    pub fn new(name: impl Into<String>, detail_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail_ref: detail_ref.into(),
        }
    }

    /// Numeric record id taken from the last path segment of `detail_ref`.
    ///
    /// `https://host/api/v2/pokemon/25/` yields `Some(25)`.
    pub fn record_id(&self) -> Option<u32> {
        self.detail_ref
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse().ok())
    }
}

/// One page of the upstream collection.
///
/// Identified by the `(limit, offset)` pair it was requested with and never
/// modified after it has been fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPage {
    /// Items in upstream order.
    pub items: Vec<ListItem>,
    /// Size of the whole collection as reported upstream.
    pub total_count: u32,
    /// Opaque cursor to the following page.
    pub next_ref: Option<String>,
    /// Opaque cursor to the preceding page.
    pub previous_ref: Option<String>,
}

impl CatalogPage {
    /// Create a page.
    pub fn new(items: Vec<ListItem>, total_count: u32) -> Self {
        Self {
            items,
            total_count,
            next_ref: None,
            previous_ref: None,
        }
    }

    /// Set the next-page cursor.
    pub fn with_next(mut self, next_ref: impl Into<String>) -> Self {
        self.next_ref = Some(next_ref.into());
        self
    }

    /// Set the previous-page cursor.
    pub fn with_previous(mut self, previous_ref: impl Into<String>) -> Self {
        self.previous_ref = Some(previous_ref.into());
        self
    }

    /// Whether upstream advertises a following page.
    pub fn has_next(&self) -> bool {
        self.next_ref.is_some()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Image references for a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRefs {
    /// Default front sprite.
    pub primary: Option<String>,
    /// High resolution artwork.
    pub artwork: Option<String>,
    /// Alternate colouring.
    pub alternate: Option<String>,
}

impl ImageRefs {
    /// Best image for a detail view: artwork first, then the primary sprite.
    pub fn preferred(&self) -> Option<&str> {
        self.artwork.as_deref().or(self.primary.as_deref())
    }
}

/// Physical measurements in upstream units (decimetres, hectograms).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurements {
    pub height: u32,
    pub weight: u32,
}

impl Measurements {
    /// Height in metres.
    pub fn height_m(&self) -> f64 {
        f64::from(self.height) / 10.0
    }

    /// Weight in kilograms.
    pub fn weight_kg(&self) -> f64 {
        f64::from(self.weight) / 10.0
    }
}

/// A named trait of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTrait {
    pub name: String,
    /// Rare (hidden) traits are rendered distinctly.
    pub is_rare: bool,
}

/// A base statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStat {
    pub stat_name: String,
    pub value: u32,
}

/// Full detail for one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u32,
    pub name: String,
    pub image_refs: ImageRefs,
    pub measurements: Measurements,
    pub category_tags: BTreeSet<String>,
    /// Traits in upstream order.
    pub traits: Vec<RecordTrait>,
    /// Base stats in upstream order.
    pub base_stats: Vec<BaseStat>,
    /// Upstream reports this as nullable.
    pub experience_value: Option<u32>,
}

impl Record {
    /// Look up a base stat by name.
    pub fn stat(&self, name: &str) -> Option<u32> {
        self.base_stats
            .iter()
            .find(|s| s.stat_name == name)
            .map(|s| s.value)
    }

    /// Sum of all base stats.
    pub fn stat_total(&self) -> u32 {
        self.base_stats.iter().map(|s| s.value).sum()
    }

    /// Traits flagged as rare.
    pub fn rare_traits(&self) -> impl Iterator<Item = &RecordTrait> {
        self.traits.iter().filter(|t| t.is_rare)
    }
}
