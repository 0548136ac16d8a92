//! Range-query worker
//!
//! Drives one logical query page by page, adapting the permit budget to the
//! capacity each page reports and folding every page into running totals.

use super::executor::QueryExecutor;
use super::paginating::PaginatingTask;
use crate::error::{Error, Result};
use crate::query::{KeyedPage, QueryPage, QueryRequest};
use crate::types::{ConsumedCapacity, Item};
use async_trait::async_trait;
use tracing::debug;

/// Running totals, owned by the worker alone
#[derive(Debug, Clone)]
struct Progress {
    returned_count: u64,
    scanned_count: u64,
    items: Vec<Item>,
    total_capacity_units: f64,
    permits: u32,
    pages: u32,
    has_next: bool,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            returned_count: 0,
            scanned_count: 0,
            items: Vec::new(),
            total_capacity_units: 0.0,
            permits: 1,
            pages: 0,
            has_next: true,
        }
    }
}

/// Paginating task for one range query, correlated to a caller key
pub struct QueryWorker<K> {
    executor: QueryExecutor,
    request: QueryRequest,
    key: K,
    progress: Progress,
}

impl<K> QueryWorker<K> {
    /// Create a worker bound to a request and a correlation key
    pub fn new(executor: QueryExecutor, request: QueryRequest, key: K) -> Self {
        Self {
            executor,
            request,
            key,
            progress: Progress::default(),
        }
    }

    /// The correlation key
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Items returned so far
    pub fn returned_count(&self) -> u64 {
        self.progress.returned_count
    }

    /// Items scanned so far
    pub fn scanned_count(&self) -> u64 {
        self.progress.scanned_count
    }

    /// Capacity units consumed so far
    pub fn total_capacity_units(&self) -> f64 {
        self.progress.total_capacity_units
    }

    /// Permits the next fetch will acquire
    pub fn permits(&self) -> u32 {
        self.progress.permits
    }

    /// Pages fetched so far
    pub fn pages_fetched(&self) -> u32 {
        self.progress.pages
    }

    /// Items accumulated so far, in fetch order
    pub fn items(&self) -> &[Item] {
        &self.progress.items
    }

    fn merged_page(&self, items: Vec<Item>) -> QueryPage {
        QueryPage {
            items,
            count: self.progress.returned_count,
            scanned_count: self.progress.scanned_count,
            consumed_capacity: Some(ConsumedCapacity::new(
                self.request.table_name.clone(),
                self.progress.total_capacity_units,
            )),
            last_evaluated_key: None,
        }
    }

    /// Consume the worker and return the merged result without copying items
    pub fn into_merged(mut self) -> KeyedPage<K> {
        let items = std::mem::take(&mut self.progress.items);
        let page = self.merged_page(items);
        KeyedPage::new(self.key, page)
    }

    fn record(&mut self, page: &QueryPage) {
        if let Some(units) = page.capacity_units() {
            self.progress.permits = self.executor.estimator().estimate(units);
            self.progress.total_capacity_units += units;
        }

        match page.next_cursor() {
            Some(cursor) => self.request.exclusive_start_key = Some(cursor.clone()),
            None => self.progress.has_next = false,
        }

        self.progress.returned_count += page.count;
        self.progress.scanned_count += page.scanned_count;
        self.progress.items.extend(page.items.iter().cloned());
        self.progress.pages += 1;
    }
}

#[async_trait]
impl<K> PaginatingTask for QueryWorker<K>
where
    K: Clone + Send,
{
    type Request = QueryRequest;
    type Output = KeyedPage<K>;

    fn has_more(&self) -> bool {
        self.progress.has_next
    }

    async fn fetch_next(&mut self) -> Result<KeyedPage<K>> {
        if !self.has_more() {
            return Err(Error::TaskExhausted {
                resource: self.request.table_name.clone(),
            });
        }

        let page = self
            .executor
            .query(&self.request, self.progress.permits)
            .await?;
        self.record(&page);

        debug!(
            "Page {} of {}: {} items ({} scanned), {:?} units, next permits {}, more: {}",
            self.progress.pages,
            self.request.table_name,
            page.count,
            page.scanned_count,
            page.capacity_units(),
            self.progress.permits,
            self.progress.has_next
        );

        Ok(KeyedPage::new(self.key.clone(), page))
    }

    fn merged_result(&self) -> KeyedPage<K> {
        KeyedPage::new(
            self.key.clone(),
            self.merged_page(self.progress.items.clone()),
        )
    }

    fn request(&self) -> &QueryRequest {
        &self.request
    }
}

impl<K: std::fmt::Debug> std::fmt::Debug for QueryWorker<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryWorker")
            .field("key", &self.key)
            .field("table", &self.request.table_name)
            .field("pages", &self.progress.pages)
            .field("returned_count", &self.progress.returned_count)
            .field("has_next", &self.progress.has_next)
            .finish_non_exhaustive()
    }
}
