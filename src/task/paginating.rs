//! Paginating task contract

use crate::error::Result;
use async_trait::async_trait;

/// A query that is driven one page at a time until its cursor runs out
///
/// A task starts active, stays active while pages carry a continuation
/// cursor, and becomes exhausted the moment a page arrives without one.
/// Callers check [`has_more`](Self::has_more) before each
/// [`fetch_next`](Self::fetch_next); fetching from an exhausted task is
/// rejected. [`merged_result`](Self::merged_result) may be called in any
/// state and reflects every page fetched so far.
///
/// A task is driven by one caller at a time. Independent tasks may run
/// concurrently.
#[async_trait]
pub trait PaginatingTask: Send {
    /// Request template the task is bound to
    type Request;

    /// Value produced per page and for the merged result
    type Output: Send;

    /// Whether another page can be fetched
    fn has_more(&self) -> bool;

    /// Fetch the next page and fold it into the running totals
    async fn fetch_next(&mut self) -> Result<Self::Output>;

    /// Everything fetched so far as a single logical page
    fn merged_result(&self) -> Self::Output;

    /// The request as it stands, cursor included
    fn request(&self) -> &Self::Request;

    /// Fetch until exhausted, then return the merged result
    async fn run_to_completion(&mut self) -> Result<Self::Output> {
        while self.has_more() {
            self.fetch_next().await?;
        }
        Ok(self.merged_result())
    }
}
