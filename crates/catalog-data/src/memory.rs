//! In-memory catalog source (for tests and offline browsing).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use catalog_core::{BaseStat, CatalogPage, ImageRefs, ListItem, Measurements, Record, RecordTrait};

use crate::client::{CatalogSource, FetchError};

const CATEGORIES: [&str; 6] = ["normal", "fire", "water", "grass", "electric", "psychic"];
const STAT_NAMES: [&str; 6] = [
    "hp",
    "attack",
    "defense",
    "special-attack",
    "special-defense",
    "speed",
];

/// Catalog source backed by a fixed list of records.
///
/// Produces `next`/`previous` cursors the same way the upstream service does,
/// counts calls per operation and can be told to fail the next N calls.
#[derive(Debug)]
pub struct InMemoryCatalog {
    base_url: String,
    records: Vec<Record>,
    latency: Duration,
    list_calls: AtomicUsize,
    record_calls: AtomicUsize,
    pending_failures: AtomicUsize,
    failure_status: u16,
}

impl InMemoryCatalog {
    /// Create a catalog over the given records.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            base_url: "memory://catalog".to_string(),
            records,
            latency: Duration::ZERO,
            list_calls: AtomicUsize::new(0),
            record_calls: AtomicUsize::new(0),
            pending_failures: AtomicUsize::new(0),
            failure_status: 503,
        }
    }

    /// Create a catalog of `count` synthetic records with ids `1..=count`.
    pub fn generated(count: u32) -> Self {
        Self::new((1..=count).map(synthetic_record).collect())
    }

    /// Simulate network latency on every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Status code used for injected failures.
    pub fn with_failure_status(mut self, status: u16) -> Self {
        self.failure_status = status;
        self
    }

    /// Fail the next `count` calls, whichever operation they are.
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Number of `list_page` calls so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_record` calls so far.
    pub fn record_calls(&self) -> usize {
        self.record_calls.load(Ordering::SeqCst)
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn detail_ref(&self, id: u32) -> String {
        format!("{}/{}/", self.base_url, id)
    }

    fn page_ref(&self, limit: u32, offset: u32) -> String {
        format!("{}?offset={}&limit={}", self.base_url, offset, limit)
    }

    async fn simulate(&self, url: String) -> Result<(), FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let failed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(FetchError::Http {
                status: self.failure_status,
                url,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn list_page(&self, limit: u32, offset: u32) -> Result<CatalogPage, FetchError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate(self.page_ref(limit, offset)).await?;

        let total = self.records.len() as u32;
        let start = offset.min(total) as usize;
        let end = offset.saturating_add(limit).min(total) as usize;

        let items = self.records[start..end]
            .iter()
            .map(|r| ListItem::new(r.name.clone(), self.detail_ref(r.id)))
            .collect();

        let mut page = CatalogPage::new(items, total);
        if offset.saturating_add(limit) < total {
            page = page.with_next(self.page_ref(limit, offset + limit));
        }
        if offset > 0 {
            page = page.with_previous(self.page_ref(limit, offset.saturating_sub(limit)));
        }
        Ok(page)
    }

    async fn get_record(&self, id_or_name: &str) -> Result<Record, FetchError> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        let url = format!("{}/{}", self.base_url, id_or_name);
        self.simulate(url.clone()).await?;

        let wanted = id_or_name.trim().to_lowercase();
        let by_id = wanted.parse::<u32>().ok();
        self.records
            .iter()
            .find(|r| Some(r.id) == by_id || r.name == wanted)
            .cloned()
            .ok_or(FetchError::Http { status: 404, url })
    }
}

/// Deterministic record used by `InMemoryCatalog::generated`.
pub fn synthetic_record(id: u32) -> Record {
    let idx = id as usize;
    let primary = CATEGORIES[idx % CATEGORIES.len()];
    let mut category_tags = std::collections::BTreeSet::new();
    category_tags.insert(primary.to_string());
    if id % 3 == 0 {
        category_tags.insert(CATEGORIES[(idx + 1) % CATEGORIES.len()].to_string());
    }

    Record {
        id,
        name: format!("specimen-{:04}", id),
        image_refs: ImageRefs {
            primary: Some(format!("sprites/{}.png", id)),
            artwork: Some(format!("artwork/{}.png", id)),
            alternate: None,
        },
        measurements: Measurements {
            height: 3 + id % 20,
            weight: 40 + (id * 7) % 900,
        },
        category_tags,
        traits: vec![
            RecordTrait {
                name: format!("{}-aura", primary),
                is_rare: false,
            },
            RecordTrait {
                name: "keen-eye".to_string(),
                is_rare: id % 4 == 0,
            },
        ],
        base_stats: STAT_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| BaseStat {
                stat_name: (*name).to_string(),
                value: 30 + ((id as usize * 13 + i * 17) % 100) as u32,
            })
            .collect(),
        experience_value: Some(50 + id % 200),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_page_cursors() {
        let catalog = InMemoryCatalog::generated(45);

        let first = catalog.list_page(20, 0).await.unwrap();
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.total_count, 45);
        assert!(first.has_next());
        assert!(first.previous_ref.is_none());
        assert_eq!(first.items[0].record_id(), Some(1));

        let last = catalog.list_page(20, 40).await.unwrap();
        assert_eq!(last.items.len(), 5);
        assert!(!last.has_next());
        assert!(last.previous_ref.is_some());

        let beyond = catalog.list_page(20, 100).await.unwrap();
        assert!(beyond.is_empty());
        assert!(!beyond.has_next());

        assert_eq!(catalog.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_get_record_by_id_and_name() {
        let catalog = InMemoryCatalog::generated(10);

        let by_id = catalog.get_record("7").await.unwrap();
        assert_eq!(by_id.name, "specimen-0007");

        let by_name = catalog.get_record("Specimen-0003").await.unwrap();
        assert_eq!(by_name.id, 3);
        assert_eq!(catalog.record_calls(), 2);
    }

    #[tokio::test]
    async fn test_get_record_missing_is_404() {
        let catalog = InMemoryCatalog::generated(3);
        let err = catalog.get_record("99").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let catalog = InMemoryCatalog::generated(3);
        catalog.fail_next(2);

        assert_eq!(catalog.list_page(1, 0).await.unwrap_err().status(), Some(503));
        assert!(catalog.get_record("1").await.is_err());
        assert!(catalog.list_page(1, 0).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_simulated() {
        let catalog = InMemoryCatalog::generated(3).with_latency(Duration::from_millis(300));
        let start = tokio::time::Instant::now();
        catalog.list_page(2, 0).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[test]
    fn test_synthetic_record_is_deterministic() {
        assert_eq!(synthetic_record(12), synthetic_record(12));
        assert_eq!(synthetic_record(12).base_stats.len(), 6);
        assert_eq!(synthetic_record(3).category_tags.len(), 2);
    }
}
