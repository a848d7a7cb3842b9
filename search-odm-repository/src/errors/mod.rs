//! Error types for the search ODM repository.
//!
//! This module provides a unified error type for mapping resolution,
//! connection and persister operations.

mod odm_error;

pub use odm_error::OdmError;
