//! Service client module
//!
//! The remote call is consumed through the [`QueryClient`] trait: one request
//! in, one page (or a classified error) out. Wire details stay behind it.
//!
//! # Implementations
//!
//! - [`HttpQueryClient`]: DynamoDB JSON 1.0 protocol over `reqwest`
//! - [`ScriptedClient`]: replays a fixed sequence of pages and failures

mod http;
mod scripted;

pub use http::{HttpClientConfig, HttpClientConfigBuilder, HttpQueryClient};
pub use scripted::{ScriptStep, ScriptedClient};

use crate::error::Result;
use crate::query::{QueryPage, QueryRequest};
use async_trait::async_trait;

/// A client able to issue one page of a range query
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Issue a single call; the request's cursor selects the page
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage>;
}

#[cfg(test)]
mod tests;
