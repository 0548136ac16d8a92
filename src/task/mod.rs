//! Paginating task module
//!
//! # Overview
//!
//! - [`PaginatingTask`] - the page-at-a-time contract
//! - [`QueryWorker`] - a task for one range query, tagged with a caller key
//! - [`QueryExecutor`] - shared handle issuing pages through the backoff executor
//! - [`PermitEstimator`] - turns reported capacity into the next permit budget
//! - [`run_all`] / [`drain`] - drive workers to completion; a [`FailedQuery`]
//!   hands back a stopped worker with its pages

mod driver;
mod executor;
mod paginating;
mod permits;
mod worker;

pub use driver::{drain, run_all, FailedQuery, QueryOutcome};
pub use executor::QueryExecutor;
pub use paginating::PaginatingTask;
pub use permits::PermitEstimator;
pub use worker::QueryWorker;
