//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dynamo-pager CLI
#[derive(Parser, Debug)]
#[command(name = "dynamo-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one range query to completion against a service endpoint
    Query {
        /// Table to query
        #[arg(short, long)]
        table: String,

        /// Key condition expression, e.g. "hk = :hk"
        #[arg(short, long)]
        key_condition: String,

        /// Secondary index to query
        #[arg(long)]
        index: Option<String>,

        /// Filter expression
        #[arg(long)]
        filter: Option<String>,

        /// Expression attribute values as JSON, e.g. '{":hk": {"S": "v1"}}'
        #[arg(long)]
        values: Option<String>,

        /// Expression attribute names as JSON, e.g. '{"#w": "weight"}'
        #[arg(long)]
        names: Option<String>,

        /// Maximum items evaluated per page
        #[arg(long)]
        limit: Option<u32>,

        /// Strongly consistent reads
        #[arg(long)]
        consistent: bool,

        /// Override the configured endpoint
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Replay a scripted query from a JSON file
    Replay {
        /// Script file with `key`, `request` and `steps`
        #[arg(short, long)]
        script: PathBuf,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Indented JSON
    Pretty,
}
