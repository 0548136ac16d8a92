//! Scripted query client
//!
//! Answers each call with the next step of a fixed script and records the
//! request it was given, so callers can check which cursor each call carried.

use super::QueryClient;
use crate::error::{Error, Result};
use crate::query::{QueryPage, QueryRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// One scripted response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Return this page
    Page { page: QueryPage },
    /// Fail with provisioned-throughput exhaustion
    Throttle,
    /// Fail with an internal server error
    ServerError,
    /// Fail with a validation error
    Validation {
        #[serde(default)]
        message: String,
    },
    /// Fail because the table does not exist
    NotFound,
    /// Fail with a permission error
    AccessDenied,
}

impl ScriptStep {
    /// Step returning a page
    pub fn page(page: QueryPage) -> Self {
        Self::Page { page }
    }

    fn into_result(self, resource: &str) -> Result<QueryPage> {
        match self {
            Self::Page { page } => Ok(page),
            Self::Throttle => Err(Error::throttled(
                resource,
                "ProvisionedThroughputExceededException",
                "scripted throttle",
            )),
            Self::ServerError => Err(Error::server(
                500,
                "InternalServerError",
                "scripted server error",
            )),
            Self::Validation { message } => Err(Error::validation("ValidationException", message)),
            Self::NotFound => Err(Error::not_found(resource)),
            Self::AccessDenied => Err(Error::access_denied(
                "AccessDeniedException",
                "scripted access denial",
            )),
        }
    }
}

/// Client replaying a fixed script
#[derive(Debug, Default)]
pub struct ScriptedClient {
    steps: Mutex<VecDeque<ScriptStep>>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl ScriptedClient {
    /// Create a client from a script
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a client that only returns pages
    pub fn pages(pages: impl IntoIterator<Item = QueryPage>) -> Self {
        Self::new(pages.into_iter().map(ScriptStep::page))
    }

    /// Number of calls received so far
    pub fn calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Copies of every request received, in call order
    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Steps not yet consumed
    pub fn remaining(&self) -> usize {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl QueryClient for ScriptedClient {
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let step = self
            .steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match step {
            Some(step) => step.into_result(request.resource()),
            None => Err(Error::validation(
                "ScriptExhausted",
                format!("no scripted response left for '{}'", request.resource()),
            )),
        }
    }
}
