//! Common types used throughout dynamo-pager
//!
//! Items travel in the DynamoDB JSON shape: every attribute value is a
//! single-key object naming its type, e.g. `{"S": "hello"}` or `{"N": "42"}`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// One record returned by a query, keyed by attribute name
pub type Item = HashMap<String, AttributeValue>;

/// Continuation cursor (the primary key of the last evaluated item)
pub type Cursor = Item;

// ============================================================================
// Attribute Values
// ============================================================================

/// A typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String
    S(String),
    /// Number, carried as its decimal string form
    N(String),
    /// Binary, base64 encoded
    B(String),
    /// Boolean
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Null marker
    #[serde(rename = "NULL")]
    Null(bool),
    /// List of values
    L(Vec<AttributeValue>),
    /// Map of values
    M(HashMap<String, AttributeValue>),
    /// String set
    SS(Vec<String>),
    /// Number set
    NS(Vec<String>),
    /// Binary set
    BS(Vec<String>),
}

impl AttributeValue {
    /// Create a string value
    pub fn s(value: impl Into<String>) -> Self {
        Self::S(value.into())
    }

    /// Create a number value
    pub fn n(value: impl ToString) -> Self {
        Self::N(value.to_string())
    }

    /// Borrow the string payload, if this is a string
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the number payload, if this is a number
    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::S(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::S(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

// ============================================================================
// Consumed Capacity
// ============================================================================

/// Capacity consumed by one call, as reported by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConsumedCapacity {
    /// Table the capacity was charged against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Capacity units consumed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_units: Option<f64>,
}

impl ConsumedCapacity {
    /// Create a capacity report for a table
    pub fn new(table_name: impl Into<String>, capacity_units: f64) -> Self {
        Self {
            table_name: Some(table_name.into()),
            capacity_units: Some(capacity_units),
        }
    }
}

/// How much consumed-capacity detail the server should report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReturnConsumedCapacity {
    /// Aggregate units for the call
    #[default]
    Total,
    /// Per-table and per-index breakdown
    Indexes,
    /// Nothing reported
    None,
}
