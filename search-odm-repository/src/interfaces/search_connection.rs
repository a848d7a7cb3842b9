//! Search connection trait definition.
//!
//! This module defines the protocol-level operations the persister needs from
//! the search engine, allowing for different transports (OpenSearch,
//! Elasticsearch, in-memory test doubles).

use async_trait::async_trait;
use serde_json::Value;

use search_odm_shared::FieldValueSet;

use crate::errors::OdmError;
use crate::types::{
    DeleteParams, GetParams, InsertParams, SearchParams, UpdateParams, WriteResponse,
};

/// Abstracts the underlying search engine transport.
///
/// Implementations are stateless: every call carries its index/type target and
/// its parameters, and `Some` parameter fields override the implementation's
/// defaults.
///
/// Writes signal a missing index or type with an unsuccessful
/// `WriteResponse` rather than an error, so batch flows can create the schema
/// and retry.
#[async_trait]
pub trait SearchConnection: Send + Sync {
    /// Check whether an index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, OdmError>;

    /// Check whether a type exists within an index.
    async fn type_exists(&self, index: &str, type_name: &str) -> Result<bool, OdmError>;

    /// Create an index, optionally with type mappings and settings.
    ///
    /// Non-text fields lose their `index` and `boost` options before the
    /// mapping is submitted.
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - The engine's `acknowledged` flag
    /// * `Err(OdmError::AlreadyExists)` - If the index is already present
    async fn create_index(
        &self,
        index: &str,
        mappings: Option<&Value>,
        settings: Option<&Value>,
    ) -> Result<bool, OdmError>;

    /// Add a type mapping to an existing index.
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - The engine's `acknowledged` flag
    /// * `Err(OdmError::NotFound)` - If the index is absent
    /// * `Err(OdmError::AlreadyExists)` - If the type is already present
    async fn create_type(
        &self,
        index: &str,
        type_name: &str,
        mappings: &Value,
    ) -> Result<bool, OdmError>;

    /// Delete an index.
    ///
    /// Wildcard and `_all` targets are refused with `Ok(false)` and no request.
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - The engine's `acknowledged` flag
    /// * `Err(OdmError::NotFound)` - If the index is absent
    async fn delete_index(&self, index: &str) -> Result<bool, OdmError>;

    /// Create a document without overwriting an existing one.
    ///
    /// Returns an unsuccessful response without a request when the index or
    /// type is missing.
    async fn insert(
        &self,
        index: &str,
        type_name: &str,
        body: &FieldValueSet,
        params: &InsertParams,
    ) -> Result<WriteResponse, OdmError>;

    /// Merge a partial document into an existing one.
    ///
    /// Succeeds when the engine response confirms the document id.
    async fn update(
        &self,
        index: &str,
        type_name: &str,
        id: &str,
        partial: &FieldValueSet,
        params: &UpdateParams,
    ) -> Result<WriteResponse, OdmError>;

    /// Delete a single document.
    ///
    /// Succeeds when the engine acknowledges the shard-level deletion.
    async fn delete(
        &self,
        index: &str,
        type_name: &str,
        id: &str,
        params: &DeleteParams,
    ) -> Result<WriteResponse, OdmError>;

    /// Fetch a document envelope by id.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(envelope))` - If the document exists and the fetch reports `found`
    /// * `Ok(None)` - Otherwise, including a missing index
    async fn get(
        &self,
        index: &str,
        type_name: &str,
        id: &str,
        params: &GetParams,
    ) -> Result<Option<Value>, OdmError>;

    /// Run a search and return the raw engine response.
    ///
    /// Returns an empty object when the index does not exist.
    async fn search(
        &self,
        index: &str,
        type_name: &str,
        body: &Value,
        params: &SearchParams,
    ) -> Result<Value, OdmError>;
}
