//! Query request and page types

use crate::types::{AttributeValue, ConsumedCapacity, Cursor, Item, ReturnConsumedCapacity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Request
// ============================================================================

/// Parameters of one range query against a table or index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryRequest {
    /// Target table
    pub table_name: String,

    /// Secondary index to query instead of the base table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    /// Key condition, e.g. `hk = :hk AND rk BETWEEN :lo AND :hi`
    pub key_condition_expression: String,

    /// Post-read filter; filtered items still count as scanned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,

    /// Attributes to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,

    /// Substitutions for `#name` placeholders
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,

    /// Substitutions for `:value` placeholders
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: Item,

    /// Maximum items evaluated per page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Strongly consistent read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,

    /// Ascending (true) or descending (false) range-key order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_index_forward: Option<bool>,

    /// Where the next page resumes; absent on the first call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_start_key: Option<Cursor>,

    /// Consumed capacity reporting, needed for permit estimation
    #[serde(default)]
    pub return_consumed_capacity: ReturnConsumedCapacity,
}

impl QueryRequest {
    /// Create a request for a table with a key condition
    pub fn new(table_name: impl Into<String>, key_condition: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            key_condition_expression: key_condition.into(),
            ..Default::default()
        }
    }

    /// Query a secondary index
    #[must_use]
    pub fn index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Set a filter expression
    #[must_use]
    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filter_expression = Some(expression.into());
        self
    }

    /// Set a projection expression
    #[must_use]
    pub fn projection(mut self, expression: impl Into<String>) -> Self {
        self.projection_expression = Some(expression.into());
        self
    }

    /// Bind a `#name` placeholder
    #[must_use]
    pub fn name(mut self, placeholder: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.expression_attribute_names
            .insert(placeholder.into(), attribute.into());
        self
    }

    /// Bind a `:value` placeholder
    #[must_use]
    pub fn value(mut self, placeholder: impl Into<String>, value: AttributeValue) -> Self {
        self.expression_attribute_values
            .insert(placeholder.into(), value);
        self
    }

    /// Set the per-page item limit
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Request strongly consistent reads
    #[must_use]
    pub fn consistent(mut self, consistent: bool) -> Self {
        self.consistent_read = Some(consistent);
        self
    }

    /// Set the range-key order
    #[must_use]
    pub fn forward(mut self, forward: bool) -> Self {
        self.scan_index_forward = Some(forward);
        self
    }

    /// Resume from a cursor
    #[must_use]
    pub fn start_from(mut self, cursor: Cursor) -> Self {
        self.exclusive_start_key = Some(cursor);
        self
    }

    /// Name of the resource permits are charged against
    pub fn resource(&self) -> &str {
        &self.table_name
    }
}

// ============================================================================
// Page
// ============================================================================

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryPage {
    /// Items in server order
    #[serde(default)]
    pub items: Vec<Item>,

    /// Items returned after filtering
    #[serde(default)]
    pub count: u64,

    /// Items evaluated before filtering
    #[serde(default)]
    pub scanned_count: u64,

    /// Capacity charged for this page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed_capacity: Option<ConsumedCapacity>,

    /// Cursor for the next page; absent or empty when exhausted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Cursor>,
}

impl QueryPage {
    /// Create a page from items, with count and scanned count equal to the item count
    pub fn new(items: Vec<Item>) -> Self {
        let count = items.len() as u64;
        Self {
            items,
            count,
            scanned_count: count,
            consumed_capacity: None,
            last_evaluated_key: None,
        }
    }

    /// Set the scanned count
    #[must_use]
    pub fn with_scanned(mut self, scanned_count: u64) -> Self {
        self.scanned_count = scanned_count;
        self
    }

    /// Set the consumed capacity
    #[must_use]
    pub fn with_capacity(mut self, table_name: impl Into<String>, units: f64) -> Self {
        self.consumed_capacity = Some(ConsumedCapacity::new(table_name, units));
        self
    }

    /// Set the continuation cursor
    #[must_use]
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.last_evaluated_key = Some(cursor);
        self
    }

    /// Capacity units reported for this page, if any
    pub fn capacity_units(&self) -> Option<f64> {
        self.consumed_capacity
            .as_ref()
            .and_then(|cc| cc.capacity_units)
    }

    /// The continuation cursor, treating an empty key as absent
    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.last_evaluated_key
            .as_ref()
            .filter(|cursor| !cursor.is_empty())
    }

    /// Whether another page follows this one
    pub fn has_cursor(&self) -> bool {
        self.next_cursor().is_some()
    }
}

// ============================================================================
// Keyed Page
// ============================================================================

/// A page paired with the correlation key of the query that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedPage<K> {
    /// Caller-supplied correlation key, never interpreted here
    pub key: K,
    /// Page data
    pub page: QueryPage,
}

impl<K> KeyedPage<K> {
    /// Pair a page with a key
    pub fn new(key: K, page: QueryPage) -> Self {
        Self { key, page }
    }

    /// Split into key and page
    pub fn into_parts(self) -> (K, QueryPage) {
        (self.key, self.page)
    }
}
