//! Permit acquisition
//!
//! Every call acquires permits from a [`PermitSource`] shared by all workers
//! before it goes out. Permits are capacity units; each target resource
//! (table) draws from its own bucket.

mod rate_limit;

pub use rate_limit::{CapacityLimiter, RateLimiterConfig, Unlimited};

use async_trait::async_trait;

/// Shared source of capacity permits, keyed by resource name
#[async_trait]
pub trait PermitSource: Send + Sync {
    /// Wait until `permits` units may be spent against `resource`
    async fn acquire(&self, resource: &str, permits: u32);
}
