//! Shared query execution handle
//!
//! Bundles the service client, the backoff executor (with its shared limiter)
//! and the permit estimator. Cloning is cheap; every worker holds a clone.

use super::permits::PermitEstimator;
use super::worker::QueryWorker;
use crate::backoff::{BackoffExecutor, BackoffPolicy};
use crate::client::QueryClient;
use crate::config::PagerConfig;
use crate::error::Result;
use crate::limit::{CapacityLimiter, PermitSource};
use crate::query::{QueryPage, QueryRequest};
use std::sync::Arc;

const QUERY: &str = "Query";

/// Issues query pages through the backoff executor
#[derive(Clone)]
pub struct QueryExecutor {
    client: Arc<dyn QueryClient>,
    backoff: BackoffExecutor,
    estimator: PermitEstimator,
}

impl QueryExecutor {
    /// Create an executor over a client and a backoff executor
    pub fn new(client: Arc<dyn QueryClient>, backoff: BackoffExecutor) -> Self {
        Self {
            client,
            backoff,
            estimator: PermitEstimator::default(),
        }
    }

    /// Build limiter, policy and estimator from configuration
    pub fn from_config(client: Arc<dyn QueryClient>, config: &PagerConfig) -> Self {
        let limiter: Arc<dyn PermitSource> = Arc::new(CapacityLimiter::with_tables(
            config.rate_limit.default_limit(),
            config.rate_limit.table_limits(),
        ));
        let policy: BackoffPolicy = config.backoff.policy();
        Self::new(client, BackoffExecutor::new(limiter, policy))
            .with_estimator(PermitEstimator::new(config.permits.overhead))
    }

    /// Replace the permit estimator
    #[must_use]
    pub fn with_estimator(mut self, estimator: PermitEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// The permit estimator workers use
    pub fn estimator(&self) -> PermitEstimator {
        self.estimator
    }

    /// The backoff executor
    pub fn backoff(&self) -> &BackoffExecutor {
        &self.backoff
    }

    /// Fetch one page, spending `permits` from the table's budget per attempt
    pub async fn query(&self, request: &QueryRequest, permits: u32) -> Result<QueryPage> {
        let client = &self.client;
        self.backoff
            .run(QUERY, request.resource(), permits, move || {
                client.query(request)
            })
            .await
    }

    /// Create a worker for one logical query
    pub fn worker<K>(&self, request: QueryRequest, key: K) -> QueryWorker<K> {
        QueryWorker::new(self.clone(), request, key)
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("backoff", &self.backoff)
            .field("estimator", &self.estimator)
            .finish_non_exhaustive()
    }
}
