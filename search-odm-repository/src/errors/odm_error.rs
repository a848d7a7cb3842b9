//! ODM error types.
//!
//! This module defines the unified error type for all persister and connection
//! operations, from mapping validation at construction time down to raw engine
//! failures.

use serde_json::Value;
use thiserror::Error;

/// Unified errors from mapping resolution, connection and persister operations.
///
/// Every error is raised synchronously from the operation that detects it.
/// Soft failures (missing schema at write time) are not errors; they surface
/// as an unsuccessful `WriteResponse` instead.
#[derive(Debug, Clone, Error)]
pub enum OdmError {
    /// The entity's mapping declaration is missing or invalid.
    #[error("Mapping validation error: {0}")]
    MappingValidation(String),

    /// Caller-supplied criteria or order keys do not resolve against the mapping.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// A caller-supplied argument is unusable (e.g. an entity without a document id).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An identity uniqueness check found an existing document.
    #[error("Unique/identity field {field} already has a document with value '{value}'")]
    ConstraintViolation { field: String, value: String },

    /// A write did not receive the expected acknowledgement from the engine.
    #[error("Unable to complete {operation} operation, engine returned: {response}")]
    OperationFailed { operation: String, response: Value },

    /// The index or type to create is already present.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The index or type to operate on is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to reach the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to parse a response from the search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to convert an entity to or from its document form.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Insert batch exceeds the configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },
}

impl OdmError {
    /// Create a mapping validation error.
    pub fn mapping_validation(msg: impl Into<String>) -> Self {
        Self::MappingValidation(msg.into())
    }

    /// Create an invalid parameters error.
    pub fn invalid_parameters(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a constraint violation for a property and the value that collided.
    pub fn constraint_violation(field: impl Into<String>, value: &Value) -> Self {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self::ConstraintViolation {
            field: field.into(),
            value,
        }
    }

    /// Create an operation failure carrying the raw engine response.
    pub fn operation_failed(operation: impl Into<String>, response: Value) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            response,
        }
    }

    /// Create an already-exists error.
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Create a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }
}

impl From<serde_json::Error> for OdmError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
