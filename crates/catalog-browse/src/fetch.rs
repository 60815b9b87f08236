//! Fetcher closures handed to the result caches.

use std::sync::Arc;

use catalog_core::{CatalogPage, Record};
use catalog_data::{CatalogSource, FetchError};
use futures::future::{BoxFuture, FutureExt};

pub(crate) fn list_page(
    source: &Arc<dyn CatalogSource>,
    limit: u32,
    offset: u32,
) -> impl Fn() -> BoxFuture<'static, Result<CatalogPage, FetchError>> + Send + Sync + 'static {
    let source = Arc::clone(source);
    move || {
        let source = Arc::clone(&source);
        async move { source.list_page(limit, offset).await }.boxed()
    }
}

pub(crate) fn record(
    source: &Arc<dyn CatalogSource>,
    id: &str,
) -> impl Fn() -> BoxFuture<'static, Result<Record, FetchError>> + Send + Sync + 'static {
    let source = Arc::clone(source);
    let id: Arc<str> = Arc::from(id);
    move || {
        let source = Arc::clone(&source);
        let id = Arc::clone(&id);
        async move { source.get_record(&id).await }.boxed()
    }
}
