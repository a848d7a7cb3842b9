//! Request parameters and response types for connection operations.
//!
//! Each operation takes a typed parameter struct whose `Some` fields override
//! the connection's built-in defaults for the same key. Body extras are
//! deep-merged into the default request body (see `utils::deep_merge`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters for a create-only document write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertParams {
    /// Explicit document id. The engine assigns one when `None`.
    pub id: Option<String>,
    /// Override the connection's refresh-before-return policy.
    pub refresh: Option<bool>,
    pub routing: Option<String>,
}

impl InsertParams {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

/// Parameters for a partial-document update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateParams {
    pub refresh: Option<bool>,
    pub retry_on_conflict: Option<u32>,
    /// Extra body clauses merged into `{"doc": ...}` (e.g. `doc_as_upsert`).
    pub extra_body: Option<Value>,
}

/// Parameters for a single-document delete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteParams {
    pub refresh: Option<bool>,
    pub routing: Option<String>,
}

/// Parameters for a single-document fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetParams {
    /// Whether to return `_source`. Defaults to true.
    pub source: Option<bool>,
    /// Source fields to leave out of the response.
    pub source_excludes: Vec<String>,
    pub routing: Option<String>,
}

/// Operator applied between query-string terms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum DefaultOperator {
    #[default]
    And,
    Or,
}

impl DefaultOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultOperator::And => "AND",
            DefaultOperator::Or => "OR",
        }
    }
}

/// Parameters for a search request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    /// Maximum number of hits. Defaults to the connection's `max_results`.
    pub size: Option<usize>,
    /// Offset of the first hit.
    pub from: Option<usize>,
    /// Defaults to `AND`.
    pub default_operator: Option<DefaultOperator>,
    /// Whether to return `_source`. Defaults to true.
    pub source: Option<bool>,
    /// Whether the shard request cache may serve this search. Defaults to false.
    pub request_cache: Option<bool>,
    /// Extra body clauses merged into the query body.
    pub extra_body: Option<Value>,
}

impl SearchParams {
    /// Pagination-only parameters.
    pub fn paged(size: Option<usize>, from: Option<usize>) -> Self {
        Self {
            size,
            from,
            ..Self::default()
        }
    }
}

/// Outcome of a write operation.
///
/// `body` holds the raw engine response for diagnostics, or `Value::Null`
/// when the write was never sent because the target schema is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteResponse {
    pub success: bool,
    pub body: Value,
}

impl WriteResponse {
    pub fn new(success: bool, body: Value) -> Self {
        Self { success, body }
    }

    /// A soft failure: the target index or type does not exist.
    pub fn missing_schema() -> Self {
        Self {
            success: false,
            body: Value::Null,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_params_with_id() {
        let params = InsertParams::with_id("123");
        assert_eq!(params.id.as_deref(), Some("123"));
        assert!(params.refresh.is_none());
    }

    #[test]
    fn test_default_operator() {
        assert_eq!(DefaultOperator::default().as_str(), "AND");
        assert_eq!(
            serde_json::to_value(DefaultOperator::Or).unwrap(),
            serde_json::json!("OR")
        );
    }

    #[test]
    fn test_missing_schema_response() {
        let response = WriteResponse::missing_schema();
        assert!(!response.is_success());
        assert!(response.body.is_null());
    }
}
