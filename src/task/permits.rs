//! Permit estimation
//!
//! The capacity a page reports includes a fixed overhead beyond the marginal
//! cost of the next fetch. Subtracting it keeps the next request from asking
//! the limiter for more than it needs; the floor of one permit keeps a query
//! moving when the server reports less than a unit.

/// Derives the next permit budget from the last reported consumption
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PermitEstimator {
    overhead: f64,
}

impl Default for PermitEstimator {
    fn default() -> Self {
        Self { overhead: 1.0 }
    }
}

impl PermitEstimator {
    /// Create an estimator with a custom per-page overhead
    pub fn new(overhead: f64) -> Self {
        Self { overhead }
    }

    /// Units assumed to be charged on every page regardless of size
    pub fn overhead(&self) -> f64 {
        self.overhead
    }

    /// `max(floor(consumed - overhead), 1)`
    pub fn estimate(&self, consumed: f64) -> u32 {
        let budget = (consumed - self.overhead).floor();
        if budget.is_finite() && budget >= 1.0 {
            budget.min(f64::from(u32::MAX)) as u32
        } else {
            1
        }
    }
}
