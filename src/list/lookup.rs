//! Reference data (countries, categories, brands) loaded once per process.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::{Result, ShopdeskError};
use crate::remote::{ListQuery, RemoteStore};

/// A read-only table fetched on first use and shared by reference after.
///
/// Concurrent first callers share a single fetch. A failed load is not
/// cached, so the next call tries again.
pub struct LookupTable<S: RemoteStore> {
    store: S,
    query: ListQuery,
    cell: OnceCell<Arc<[S::Item]>>,
}

impl<S: RemoteStore> LookupTable<S> {
    /// Table backed by one bounded request of `limit` rows.
    pub fn new(store: S, limit: u32) -> Self {
        Self::with_query(store, ListQuery::new(limit))
    }

    pub fn with_query(store: S, query: ListQuery) -> Self {
        Self {
            store,
            query,
            cell: OnceCell::new(),
        }
    }

    /// The rows, fetching them on first call.
    pub async fn get(&self) -> Result<Arc<[S::Item]>> {
        let rows = self
            .cell
            .get_or_try_init(|| async {
                let page = self.store.fetch_page(&self.query).await?;
                if page.total_count > page.items.len() as u64 {
                    tracing::warn!(
                        "lookup table truncated: {} of {} rows loaded",
                        page.items.len(),
                        page.total_count
                    );
                }
                Ok::<_, ShopdeskError>(Arc::from(page.items))
            })
            .await?;
        Ok(Arc::clone(rows))
    }

    /// Rows if they have already been loaded.
    pub fn cached(&self) -> Option<Arc<[S::Item]>> {
        self.cell.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}
