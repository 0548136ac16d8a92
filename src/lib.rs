//! # dynamo-pager
//!
//! A self-throttling, paginated, retrying query executor for capacity-limited
//! key-value services with a DynamoDB-style `Query` API.
//!
//! ## Features
//!
//! - **Pagination**: drives a query page by page until the cursor runs out
//! - **Merged Results**: all pages folded into one logical page on demand
//! - **Adaptive Permits**: each page's reported capacity sizes the next request
//! - **Shared Rate Limiting**: token buckets per table, shared by all workers
//! - **Retry with Backoff**: exponential, capped, optionally jittered
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dynamo_pager::client::{HttpClientConfig, HttpQueryClient};
//! use dynamo_pager::config::PagerConfig;
//! use dynamo_pager::query::QueryRequest;
//! use dynamo_pager::task::{PaginatingTask, QueryExecutor};
//! use dynamo_pager::types::AttributeValue;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> dynamo_pager::Result<()> {
//!     let config = PagerConfig::default();
//!     let client = Arc::new(HttpQueryClient::with_config(config.http_client())?);
//!     let executor = QueryExecutor::from_config(client, &config);
//!
//!     let request = QueryRequest::new("edgestore", "hk = :hk")
//!         .value(":hk", AttributeValue::s("v1"));
//!     let mut worker = executor.worker(request, "v1");
//!
//!     while worker.has_more() {
//!         let page = worker.fetch_next().await?;
//!         println!("{}: {} items", page.key, page.page.count);
//!     }
//!     let merged = worker.merged_result();
//!     println!("total: {}", merged.page.count);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ QueryWorker (PaginatingTask)                             │
//! │  has_more() / fetch_next() / merged_result()             │
//! │  cursor + running totals, PermitEstimator                │
//! └─────────────────────────────┬────────────────────────────┘
//!                               │ request, permits
//! ┌─────────────────────────────┴────────────────────────────┐
//! │ BackoffExecutor                                          │
//! │  acquire permits → call → retry recoverable failures     │
//! └───────────────┬───────────────────────────┬──────────────┘
//!                 │                           │
//!      ┌──────────┴─────────┐      ┌──────────┴──────────┐
//!      │ PermitSource       │      │ QueryClient         │
//!      │ CapacityLimiter    │      │ HttpQueryClient     │
//!      │ (bucket per table) │      │ ScriptedClient      │
//!      └────────────────────┘      └─────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types and failure classification
pub mod error;

/// Common types: attribute values, items, consumed capacity
pub mod types;

/// Query request and page types
pub mod query;

/// Service client trait and implementations
pub mod client;

/// Shared permit sources
pub mod limit;

/// Retry with exponential backoff
pub mod backoff;

/// Paginating tasks, workers and drivers
pub mod task;

/// Configuration loading
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorClass, Result};
pub use query::{KeyedPage, QueryPage, QueryRequest};
pub use task::{PaginatingTask, QueryExecutor, QueryWorker};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
