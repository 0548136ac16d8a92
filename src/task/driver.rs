//! Drives many workers at once
//!
//! Each worker runs sequentially through its own pages; up to `concurrency`
//! workers are in flight together, all sharing the executor's limiter.

use super::paginating::PaginatingTask;
use super::worker::QueryWorker;
use crate::error::Error;
use crate::query::KeyedPage;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// Merged page of a finished worker, or the worker that failed
pub type QueryOutcome<K> = std::result::Result<KeyedPage<K>, FailedQuery<K>>;

/// A worker stopped by an error, with the pages it fetched before it
#[derive(Debug)]
pub struct FailedQuery<K> {
    /// The worker, left as it was after its last successful page
    pub worker: QueryWorker<K>,
    /// Why the next page could not be fetched
    pub error: Error,
}

impl<K> FailedQuery<K> {
    /// Correlation key of the failed worker
    pub fn key(&self) -> &K {
        self.worker.key()
    }

    /// Pages fetched before the failure, merged
    pub fn into_partial(self) -> (KeyedPage<K>, Error) {
        (self.worker.into_merged(), self.error)
    }
}

impl<K> From<FailedQuery<K>> for Error {
    fn from(failed: FailedQuery<K>) -> Self {
        failed.error
    }
}

/// Run one worker until exhausted and return its merged result
///
/// On failure the worker comes back with the error, so pages fetched so far
/// stay available.
pub async fn drain<K>(mut worker: QueryWorker<K>) -> QueryOutcome<K>
where
    K: Clone + Send,
{
    while worker.has_more() {
        let fetched = worker.fetch_next().await;
        if let Err(error) = fetched {
            return Err(FailedQuery { worker, error });
        }
    }
    Ok(worker.into_merged())
}

/// Run every worker to completion, at most `concurrency` at a time
///
/// Every worker runs until it is exhausted or fails; one failure never stops
/// the others. Outcomes come back in completion order, so callers match them
/// up through the correlation key.
pub async fn run_all<K, I>(workers: I, concurrency: usize) -> Vec<QueryOutcome<K>>
where
    K: Clone + Send,
    I: IntoIterator<Item = QueryWorker<K>>,
{
    let limit = concurrency.max(1);
    let outcomes: Vec<QueryOutcome<K>> = stream::iter(workers.into_iter().map(drain))
        .buffer_unordered(limit)
        .collect()
        .await;

    let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
    if failed > 0 {
        warn!("{failed} of {} queries failed", outcomes.len());
    }
    debug!(
        "Completed {} queries with concurrency {limit}",
        outcomes.len()
    );
    outcomes
}
