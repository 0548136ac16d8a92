//! Query module
//!
//! Request and response shapes for one paginated range query.
//!
//! # Overview
//!
//! A [`QueryRequest`] carries immutable query parameters plus the mutable
//! continuation cursor (`exclusive_start_key`). Each call yields a
//! [`QueryPage`]; pages emitted by a worker are paired with the caller's
//! correlation key as a [`KeyedPage`].

mod types;

pub use types::{KeyedPage, QueryPage, QueryRequest};
