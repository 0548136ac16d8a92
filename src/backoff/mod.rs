//! Backoff module
//!
//! Executes one logical remote call reliably: acquire permits, call, and on a
//! recoverable failure sleep and try again with an exponentially growing
//! delay, up to a bounded number of attempts.
//!
//! # Features
//!
//! - **Permit acquisition**: every attempt first waits on the shared limiter
//! - **Exponential delay**: base delay times a multiplier, capped
//! - **Jitter**: optional, spreads retries of workers sharing a table
//! - **Error classes**: only recoverable errors are retried

mod executor;
mod policy;

pub use executor::{BackoffExecutor, RecordingSleeper, Sleeper, TokioSleeper};
pub use policy::{BackoffPolicy, BackoffState};

#[cfg(test)]
mod tests;
