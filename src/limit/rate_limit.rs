//! Rate limiting implementation
//!
//! Uses the governor crate for token bucket rate limiting, one bucket per
//! table. Buckets are created on first use.

use super::PermitSource;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

type Bucket = Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Configuration for one token bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Capacity units replenished per second
    pub units_per_second: u32,
    /// Bucket size (max units spendable at once)
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            units_per_second: 100,
            burst_size: 100,
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(units_per_second: u32, burst_size: u32) -> Self {
        Self {
            units_per_second,
            burst_size,
        }
    }

    fn burst(&self) -> NonZeroU32 {
        NonZeroU32::new(self.burst_size).unwrap_or(NonZeroU32::MIN)
    }

    fn bucket(&self) -> Bucket {
        let quota = Quota::per_second(NonZeroU32::new(self.units_per_second).unwrap_or(NonZeroU32::MIN))
            .allow_burst(self.burst());
        Governor::direct(quota)
    }
}

struct TableBucket {
    limiter: Bucket,
    burst: NonZeroU32,
}

/// Token bucket limiter keyed by table name
#[derive(Clone)]
pub struct CapacityLimiter {
    default: RateLimiterConfig,
    overrides: Arc<HashMap<String, RateLimiterConfig>>,
    buckets: Arc<RwLock<HashMap<String, Arc<TableBucket>>>>,
}

impl CapacityLimiter {
    /// Create a limiter applying `default` to every table
    pub fn new(default: RateLimiterConfig) -> Self {
        Self::with_tables(default, HashMap::new())
    }

    /// Create a limiter with per-table overrides
    pub fn with_tables(
        default: RateLimiterConfig,
        overrides: HashMap<String, RateLimiterConfig>,
    ) -> Self {
        Self {
            default,
            overrides: Arc::new(overrides),
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The config governing a table
    pub fn config_for(&self, resource: &str) -> RateLimiterConfig {
        self.overrides.get(resource).copied().unwrap_or(self.default)
    }

    /// Try to take permits without waiting
    pub fn try_acquire(&self, resource: &str, permits: u32) -> bool {
        let bucket = self.bucket(resource);
        let n = clamp(permits, bucket.burst);
        matches!(bucket.limiter.check_n(n), Ok(Ok(())))
    }

    fn bucket(&self, resource: &str) -> Arc<TableBucket> {
        if let Some(bucket) = self
            .buckets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(resource)
        {
            return Arc::clone(bucket);
        }

        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets.entry(resource.to_string()).or_insert_with(|| {
            let config = self.config_for(resource);
            debug!(
                "Creating rate limiter for {resource}: {} units/s, burst {}",
                config.units_per_second, config.burst_size
            );
            Arc::new(TableBucket {
                limiter: config.bucket(),
                burst: config.burst(),
            })
        });
        Arc::clone(bucket)
    }
}

/// Permits above the bucket size can never be granted at once
fn clamp(permits: u32, burst: NonZeroU32) -> NonZeroU32 {
    NonZeroU32::new(permits.min(burst.get())).unwrap_or(NonZeroU32::MIN)
}

#[async_trait]
impl PermitSource for CapacityLimiter {
    async fn acquire(&self, resource: &str, permits: u32) {
        let bucket = self.bucket(resource);
        let n = clamp(permits, bucket.burst);
        if n.get() < permits {
            debug!(
                "Clamped {permits} permits to burst size {} for {resource}",
                n.get()
            );
        }
        if let Err(e) = bucket.limiter.until_n_ready(n).await {
            warn!("Bucket for {resource} cannot grant {} permits: {e}", n.get());
        }
    }
}

impl Default for CapacityLimiter {
    fn default() -> Self {
        Self::new(RateLimiterConfig::default())
    }
}

impl std::fmt::Debug for CapacityLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapacityLimiter")
            .field("default", &self.default)
            .field("overrides", &self.overrides.len())
            .finish_non_exhaustive()
    }
}

/// Permit source that never waits
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

#[async_trait]
impl PermitSource for Unlimited {
    async fn acquire(&self, _resource: &str, _permits: u32) {}
}
