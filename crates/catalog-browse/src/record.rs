//! Record detail loading for cards and the detail view.

use std::sync::Arc;

use catalog_cache::{CacheKey, ResultCache};
use catalog_core::{ListItem, Record};
use catalog_data::{CatalogSource, FetchError};
use futures::future::join_all;

use crate::fetch;

/// Render state of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordView {
    pub id: String,
    pub record: Option<Record>,
    pub is_loading: bool,
    pub is_fetching: bool,
    pub error: Option<FetchError>,
}

impl RecordView {
    pub fn is_not_found(&self) -> bool {
        self.error.as_ref().is_some_and(FetchError::is_not_found)
    }
}

/// Loads records through the long-lived record cache.
#[derive(Clone)]
pub struct RecordLoader {
    source: Arc<dyn CatalogSource>,
    records: ResultCache<Record>,
}

impl RecordLoader {
    pub fn new(source: Arc<dyn CatalogSource>, records: ResultCache<Record>) -> Self {
        Self { source, records }
    }

    /// Load one record by id or name.
    pub async fn load(&self, id: &str) -> Result<Record, FetchError> {
        let lookup = self
            .records
            .get(CacheKey::record(id), fetch::record(&self.source, id))
            .await?;
        Ok(lookup.value)
    }

    /// Clear a failed record and fetch it again from attempt 0.
    pub async fn retry(&self, id: &str) -> Result<Record, FetchError> {
        let lookup = self
            .records
            .retry(CacheKey::record(id), fetch::record(&self.source, id))
            .await?;
        Ok(lookup.value)
    }

    pub fn state(&self, id: &str) -> RecordView {
        let state = self.records.state(&CacheKey::record(id));
        RecordView {
            id: id.to_string(),
            record: state.data,
            is_loading: state.is_loading,
            is_fetching: state.is_fetching,
            error: state.error,
        }
    }

    /// Load the records behind a row of list items concurrently.
    ///
    /// Items are keyed by their numeric id when the reference carries one,
    /// otherwise by name. Results keep the order of `items`.
    pub async fn load_cards(&self, items: &[ListItem]) -> Vec<Result<Record, FetchError>> {
        let ids: Vec<String> = items.iter().map(card_id).collect();
        join_all(ids.iter().map(|id| self.load(id))).await
    }

    /// Render state of the card behind each item, in order. Never fetches.
    pub fn cards(&self, items: &[ListItem]) -> Vec<RecordView> {
        items.iter().map(|item| self.state(&card_id(item))).collect()
    }
}

fn card_id(item: &ListItem) -> String {
    item.record_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| item.name.clone())
}

impl std::fmt::Debug for RecordLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordLoader")
            .field("cached", &self.records.len())
            .finish()
    }
}
