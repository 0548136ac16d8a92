//! CLI module
//!
//! Command-line interface for running queries.
//!
//! # Commands
//!
//! - `query` - Run one range query against a service endpoint
//! - `replay` - Run a query against a scripted sequence of responses

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{load_script, ReplayScript, Runner};
