//! HTTP query client
//!
//! Speaks the DynamoDB JSON 1.0 protocol:
//! - `POST /` with an `X-Amz-Target` header naming the operation
//! - PascalCase JSON request and response bodies
//! - Failures carry a `__type` such as
//!   `com.amazonaws.dynamodb.v20120810#ProvisionedThroughputExceededException`
//!
//! Requests are not signed. Use `default_headers` to pass a static
//! `Authorization` header to endpoints that only need one (DynamoDB Local).

use super::QueryClient;
use crate::error::{Error, Result};
use crate::query::{QueryPage, QueryRequest};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

const QUERY_TARGET: &str = "DynamoDB_20120810.Query";
const AMZ_JSON: &str = "application/x-amz-json-1.0";

/// Configuration for the HTTP query client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Service endpoint, e.g. `http://localhost:8000`
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(30),
            default_headers: HashMap::new(),
            user_agent: format!("dynamo-pager/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the endpoint
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Query client over HTTP
pub struct HttpQueryClient {
    client: Client,
    endpoint: Url,
    config: HttpClientConfig,
}

impl HttpQueryClient {
    /// Create a client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    /// The endpoint requests are sent to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl QueryClient for HttpQueryClient {
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        let body = serde_json::to_vec(request)?;

        let mut req = self
            .client
            .post(self.endpoint.clone())
            .header("X-Amz-Target", QUERY_TARGET)
            .header(CONTENT_TYPE, AMZ_JSON);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let response = req.body(body).send().await?;
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            let page: QueryPage = serde_json::from_slice(&bytes)
                .map_err(|e| Error::malformed(format!("query response: {e}")))?;
            debug!(
                "Query {} returned {} items ({} scanned)",
                request.table_name, page.count, page.scanned_count
            );
            return Ok(page);
        }

        let text = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &text, request.resource()))
    }
}

impl std::fmt::Debug for HttpQueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpQueryClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

/// Error body returned by the service
#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(default, alias = "Message")]
    message: String,
}

impl ServiceErrorBody {
    /// Error code without the namespace prefix
    fn code(&self) -> &str {
        self.error_type
            .rsplit_once('#')
            .map_or(self.error_type.as_str(), |(_, code)| code)
    }
}

/// Map a failed response onto the error taxonomy
pub(crate) fn classify_failure(status: StatusCode, body: &str, resource: &str) -> Error {
    let parsed: ServiceErrorBody = serde_json::from_str(body).unwrap_or_else(|_| ServiceErrorBody {
        error_type: String::new(),
        message: body.to_string(),
    });
    let code = parsed.code().to_string();
    let message = parsed.message;

    match code.as_str() {
        "ProvisionedThroughputExceededException" | "ThrottlingException" | "RequestLimitExceeded" => {
            Error::throttled(resource, code, message)
        }
        "InternalServerError" | "InternalFailure" | "ServiceUnavailable" => {
            Error::server(status.as_u16(), code, message)
        }
        "ResourceNotFoundException" => Error::not_found(resource),
        "AccessDeniedException"
        | "UnrecognizedClientException"
        | "MissingAuthenticationTokenException" => Error::access_denied(code, message),
        _ if status == StatusCode::TOO_MANY_REQUESTS => Error::throttled(resource, code, message),
        _ if status.is_server_error() => Error::server(status.as_u16(), code, message),
        _ if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
            Error::access_denied(code, message)
        }
        _ => Error::validation(code, message),
    }
}
