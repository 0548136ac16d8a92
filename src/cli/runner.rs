//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::{HttpQueryClient, QueryClient, ScriptStep, ScriptedClient};
use crate::config::{load_config, PagerConfig};
use crate::error::{Error, Result};
use crate::query::{KeyedPage, QueryRequest};
use crate::task::{PaginatingTask, QueryExecutor};
use crate::types::Item;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// A scripted query: the request, its correlation key, and the responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Correlation key echoed on every page
    #[serde(default)]
    pub key: Value,
    /// Request template
    pub request: QueryRequest,
    /// Responses in call order
    pub steps: Vec<ScriptStep>,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Query {
                table,
                key_condition,
                index,
                filter,
                values,
                names,
                limit,
                consistent,
                endpoint,
            } => {
                let mut request = QueryRequest::new(table, key_condition);
                request.index_name.clone_from(index);
                request.filter_expression.clone_from(filter);
                request.limit = *limit;
                if *consistent {
                    request.consistent_read = Some(true);
                }
                if let Some(values) = values {
                    request.expression_attribute_values = parse_json::<Item>("--values", values)?;
                }
                if let Some(names) = names {
                    request.expression_attribute_names =
                        parse_json::<HashMap<String, String>>("--names", names)?;
                }
                self.query(request, endpoint.as_deref(), &config).await
            }
            Commands::Replay { script } => self.replay(script, &config).await,
        }
    }

    /// Load configuration, falling back to defaults
    fn load_config(&self) -> Result<PagerConfig> {
        match &self.cli.config {
            Some(path) => load_config(path),
            None => Ok(PagerConfig::default()),
        }
    }

    /// Run a query against the service and print the merged page
    async fn query(
        &self,
        request: QueryRequest,
        endpoint: Option<&str>,
        config: &PagerConfig,
    ) -> Result<()> {
        let mut http = config.http_client();
        if let Some(endpoint) = endpoint {
            http.endpoint = endpoint.to_string();
        }

        let client: Arc<dyn QueryClient> = Arc::new(HttpQueryClient::with_config(http)?);
        let executor = QueryExecutor::from_config(client, config);
        let key = request.table_name.clone();
        let mut worker = executor.worker(request, key);

        let start = Instant::now();
        let merged = worker.run_to_completion().await?;
        info!(
            "Query finished: {} pages, {} items, {:.1} capacity units in {:?}",
            worker.pages_fetched(),
            merged.page.count,
            worker.total_capacity_units(),
            start.elapsed()
        );

        self.emit(&merged_message(&merged)?)
    }

    /// Replay a scripted query, printing every page and the merged result
    async fn replay(&self, path: &Path, config: &PagerConfig) -> Result<()> {
        let script = load_script(path)?;
        let client = Arc::new(ScriptedClient::new(script.steps));
        let executor = QueryExecutor::from_config(client, config);
        let mut worker = executor.worker(script.request, script.key);

        while worker.has_more() {
            let page = worker.fetch_next().await?;
            self.emit(&json!({
                "type": "page",
                "key": page.key,
                "count": page.page.count,
                "scanned_count": page.page.scanned_count,
                "capacity_units": page.page.capacity_units(),
                "next_permits": worker.permits(),
                "has_more": worker.has_more(),
            }))?;
        }

        self.emit(&merged_message(&worker.merged_result())?)
    }

    fn emit(&self, message: &Value) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(message)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(message)?,
        };
        println!("{line}");
        Ok(())
    }
}

fn merged_message<K: Serialize>(merged: &KeyedPage<K>) -> Result<Value> {
    Ok(json!({
        "type": "merged",
        "key": serde_json::to_value(&merged.key)?,
        "page": serde_json::to_value(&merged.page)?,
    }))
}

/// Load a replay script from disk
pub fn load_script(path: &Path) -> Result<ReplayScript> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read script file '{}': {}",
            path.display(),
            e
        ))
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn parse_json<T: serde::de::DeserializeOwned>(flag: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| Error::invalid_value(flag, e.to_string()))
}
