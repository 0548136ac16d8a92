//! Error types for dynamo-pager
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Remote-call failures are classified into two classes (see [`ErrorClass`]):
//! recoverable failures are retried by the backoff executor, fatal failures
//! are surfaced immediately. Running out of attempts produces the distinct
//! [`Error::RetriesExhausted`] variant so callers can tell "gave up" apart
//! from "rejected".

use thiserror::Error;

/// Whether a failure is worth retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Throttling, transient server failure, transport hiccup
    Recoverable,
    /// Validation, missing resource, permission failure, local errors
    Fatal,
}

/// The main error type for dynamo-pager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Remote Service Errors (recoverable)
    // ============================================================================
    #[error("Throttled on '{resource}' ({code}): {message}")]
    Throttled {
        resource: String,
        code: String,
        message: String,
    },

    #[error("Server error {status} ({code}): {message}")]
    ServerError {
        status: u16,
        code: String,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // ============================================================================
    // Remote Service Errors (fatal)
    // ============================================================================
    #[error("Validation failed ({code}): {message}")]
    Validation { code: String, message: String },

    #[error("Resource not found: {resource}")]
    ResourceNotFound { resource: String },

    #[error("Access denied ({code}): {message}")]
    AccessDenied { code: String, message: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    // ============================================================================
    // Executor Errors
    // ============================================================================
    #[error("{operation} on '{resource}' gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        resource: String,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Query on '{resource}' is exhausted, no further pages")]
    TaskExhausted { resource: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a throttling error
    pub fn throttled(
        resource: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Throttled {
            resource: resource.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a transient server error
    pub fn server(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a resource-not-found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource: resource.into(),
        }
    }

    /// Create an access-denied error
    pub fn access_denied(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AccessDenied {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Classify this error for retry decisions
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Throttled { .. } | Error::ServerError { .. } => ErrorClass::Recoverable,
            Error::Http(e) if e.is_timeout() || e.is_connect() => ErrorClass::Recoverable,
            _ => ErrorClass::Fatal,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Recoverable
    }

    /// Check if this error came from running out of attempts
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Error::RetriesExhausted { .. })
    }
}

/// Result type alias for dynamo-pager
pub type Result<T> = std::result::Result<T, Error>;
