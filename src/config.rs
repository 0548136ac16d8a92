//! Configuration types
//!
//! All settings load from YAML and every field has a default, so an empty
//! document is a valid configuration:
//!
//! ```yaml
//! endpoint: http://localhost:8000
//! backoff:
//!   initial_ms: 25
//!   max_ms: 10000
//!   max_attempts: 10
//! rate_limit:
//!   units_per_second: 100
//!   tables:
//!     edgestore: { units_per_second: 50, burst_size: 50 }
//! ```

use crate::backoff::BackoffPolicy;
use crate::client::HttpClientConfig;
use crate::error::{Error, Result};
use crate::limit::RateLimiterConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete configuration loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagerConfig {
    /// Service endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Retry backoff configuration
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Permit estimation configuration
    #[serde(default)]
    pub permits: PermitConfig,

    /// Queries driven at once by the multi-query driver
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout(),
            headers: HashMap::new(),
            backoff: BackoffConfig::default(),
            rate_limit: RateLimitConfig::default(),
            permits: PermitConfig::default(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_concurrency() -> usize {
    8
}

impl PagerConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the types alone cannot rule out
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(Error::invalid_value("timeout_seconds", "must be positive"));
        }
        if self.concurrency == 0 {
            return Err(Error::invalid_value("concurrency", "must be positive"));
        }
        self.backoff.validate()?;
        self.rate_limit.validate()?;
        self.permits.validate()
    }

    /// HTTP client settings derived from this config
    pub fn http_client(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .endpoint(&self.endpoint)
            .timeout(Duration::from_secs(self.timeout_seconds));
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }
}

/// Load a configuration file
pub fn load_config(path: impl AsRef<Path>) -> Result<PagerConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;
    PagerConfig::from_yaml_str(&content)
}

// ============================================================================
// Backoff
// ============================================================================

/// Retry backoff configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,

    /// Multiplier for exponential backoff
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Total attempts per call, first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Randomize delays
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
            multiplier: default_multiplier(),
            max_attempts: default_max_attempts(),
            jitter: default_true(),
        }
    }
}

fn default_initial_ms() -> u64 {
    25
}

fn default_max_ms() -> u64 {
    10_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_attempts() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

impl BackoffConfig {
    /// The policy this config describes
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.initial_ms),
            Duration::from_millis(self.max_ms),
        )
        .with_multiplier(self.multiplier)
        .with_max_attempts(self.max_attempts)
        .with_jitter(self.jitter)
    }

    fn validate(&self) -> Result<()> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(Error::invalid_value(
                "backoff.multiplier",
                format!("must be a finite number >= 1, got {}", self.multiplier),
            ));
        }
        if self.max_attempts == 0 {
            return Err(Error::invalid_value("backoff.max_attempts", "must be positive"));
        }
        if self.initial_ms > self.max_ms {
            return Err(Error::invalid_value(
                "backoff.initial_ms",
                format!("{} exceeds max_ms {}", self.initial_ms, self.max_ms),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Rate Limiting
// ============================================================================

/// Token bucket settings for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLimit {
    /// Capacity units replenished per second
    pub units_per_second: u32,

    /// Bucket size; defaults to one second of capacity
    #[serde(default)]
    pub burst_size: Option<u32>,
}

impl TableLimit {
    fn limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig::new(
            self.units_per_second,
            self.burst_size.unwrap_or(self.units_per_second),
        )
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Capacity units per second for tables without an override
    #[serde(default = "default_units_per_second")]
    pub units_per_second: u32,

    /// Bucket size for tables without an override
    #[serde(default)]
    pub burst_size: Option<u32>,

    /// Per-table overrides
    #[serde(default)]
    pub tables: HashMap<String, TableLimit>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            units_per_second: default_units_per_second(),
            burst_size: None,
            tables: HashMap::new(),
        }
    }
}

fn default_units_per_second() -> u32 {
    100
}

impl RateLimitConfig {
    /// Limit applied to tables without an override
    pub fn default_limit(&self) -> RateLimiterConfig {
        TableLimit {
            units_per_second: self.units_per_second,
            burst_size: self.burst_size,
        }
        .limiter_config()
    }

    /// Per-table limits
    pub fn table_limits(&self) -> HashMap<String, RateLimiterConfig> {
        self.tables
            .iter()
            .map(|(table, limit)| (table.clone(), limit.limiter_config()))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        let all = std::iter::once((
            "rate_limit".to_string(),
            self.default_limit(),
        ))
        .chain(
            self.table_limits()
                .into_iter()
                .map(|(table, limit)| (format!("rate_limit.tables.{table}"), limit)),
        );

        for (field, limit) in all {
            if limit.units_per_second == 0 || limit.burst_size == 0 {
                return Err(Error::invalid_value(
                    field,
                    "units_per_second and burst_size must be positive",
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Permits
// ============================================================================

/// Permit estimation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitConfig {
    /// Units assumed charged on every page beyond its marginal cost
    #[serde(default = "default_overhead")]
    pub overhead: f64,
}

impl Default for PermitConfig {
    fn default() -> Self {
        Self {
            overhead: default_overhead(),
        }
    }
}

fn default_overhead() -> f64 {
    1.0
}

impl PermitConfig {
    fn validate(&self) -> Result<()> {
        if !self.overhead.is_finite() || self.overhead < 0.0 {
            return Err(Error::invalid_value(
                "permits.overhead",
                format!("must be a finite number >= 0, got {}", self.overhead),
            ));
        }
        Ok(())
    }
}
