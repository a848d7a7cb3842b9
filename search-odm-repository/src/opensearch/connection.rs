//! OpenSearch connection implementation.
//!
//! This module provides the concrete implementation of `SearchConnection`
//! using the OpenSearch Rust crate. Requests are issued through the raw
//! `OpenSearch::send` API because document types are part of every
//! document path (`/{index}/{type}/{id}`).

use async_trait::async_trait;
use opensearch::{
    http::{
        headers::HeaderMap,
        request::JsonBody,
        transport::{SingleNodeConnectionPool, TransportBuilder},
        Method, StatusCode,
    },
    OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use url::Url;

use search_odm_shared::FieldValueSet;

use crate::config::ConnectionConfig;
use crate::errors::OdmError;
use crate::interfaces::SearchConnection;
use crate::mapping::prune_non_text_options;
use crate::types::{
    DeleteParams, GetParams, InsertParams, SearchParams, UpdateParams, WriteResponse,
};
use crate::utils::{deep_merge, is_wildcard_index};

type QueryPairs = Vec<(&'static str, String)>;

/// OpenSearch connection.
///
/// # Example
///
/// ```ignore
/// use search_odm_repository::{ConnectionConfig, OpenSearchConnection, SearchConnection};
///
/// let connection = OpenSearchConnection::new(ConnectionConfig::from_env())?;
/// if !connection.index_exists("products").await? {
///     connection.create_index("products", None, None).await?;
/// }
/// ```
pub struct OpenSearchConnection {
    client: OpenSearch,
    config: ConnectionConfig,
}

impl OpenSearchConnection {
    /// Create a new connection to the configured URL.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchConnection)` - A new connection instance
    /// * `Err(OdmError)` - If the URL is invalid or transport setup fails
    pub fn new(config: ConnectionConfig) -> Result<Self, OdmError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| OdmError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| OdmError::connection(e.to_string()))?;

        info!(
            url = %config.url,
            max_results = config.max_results,
            refresh = config.refresh,
            "Created OpenSearch connection"
        );

        Ok(Self::from_client(OpenSearch::new(transport), config))
    }

    /// Wrap an already configured client.
    pub fn from_client(client: OpenSearch, config: ConnectionConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Build a request path from raw segments, percent-encoding each one.
    fn path(segments: &[&str]) -> Result<String, OdmError> {
        let mut url = Url::parse("http://localhost/").map_err(|e| OdmError::connection(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| OdmError::connection("cannot build request path"))?
            .clear()
            .extend(segments);
        Ok(url.path().to_string())
    }

    fn refresh_param(&self, requested: Option<bool>) -> (&'static str, String) {
        ("refresh", requested.unwrap_or(self.config.refresh).to_string())
    }

    /// Send a request and read back its status and JSON body.
    ///
    /// An empty body (HEAD requests, some errors) is returned as `Value::Null`.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &QueryPairs,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), OdmError> {
        let response = self
            .client
            .send(
                method,
                path,
                HeaderMap::new(),
                Some(query.as_slice()),
                body.map(JsonBody::new),
                None,
            )
            .await
            .map_err(|e| OdmError::connection(e.to_string()))?;

        let status = response.status_code();
        let text = response
            .text()
            .await
            .map_err(|e| OdmError::connection(e.to_string()))?;

        if text.trim().is_empty() {
            return Ok((status, Value::Null));
        }

        let body = serde_json::from_str(&text)
            .map_err(|e| OdmError::parse(format!("{} (status {}): {}", e, status, text)))?;
        Ok((status, body))
    }

    /// Issue a HEAD request and map 200/404 onto a boolean.
    async fn exists(&self, path: &str, query: &QueryPairs) -> Result<bool, OdmError> {
        let (status, _) = self.request(Method::Head, path, query, None).await?;
        match status.as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            other => Err(OdmError::connection(format!(
                "Unexpected status {} checking {}",
                other, path
            ))),
        }
    }

    fn acknowledged(operation: &str, status: StatusCode, body: &Value) -> bool {
        if !status.is_success() {
            error!(status = %status, body = %body, operation, "Schema request failed");
        }
        body.get("acknowledged")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn insert_succeeded(status: StatusCode, body: &Value) -> bool {
        status.is_success()
            && (body.get("created").and_then(Value::as_bool) == Some(true)
                || body.get("result").and_then(Value::as_str) == Some("created"))
    }

    fn update_succeeded(status: StatusCode, body: &Value) -> bool {
        status.is_success() && body.get("_id").is_some()
    }

    fn delete_succeeded(status: StatusCode, body: &Value) -> bool {
        let marked = body.get("found").is_some() || body.get("result").is_some();
        let successful_shards = body
            .pointer("/_shards/successful")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        status.is_success() && marked && successful_shards > 0
    }
}

#[async_trait]
impl SearchConnection for OpenSearchConnection {
    async fn index_exists(&self, index: &str) -> Result<bool, OdmError> {
        self.exists(&Self::path(&[index])?, &QueryPairs::new()).await
    }

    async fn type_exists(&self, index: &str, type_name: &str) -> Result<bool, OdmError> {
        let query = vec![("ignore_unavailable", "true".to_string())];
        self.exists(&Self::path(&[index, "_mapping", type_name])?, &query)
            .await
    }

    async fn create_index(
        &self,
        index: &str,
        mappings: Option<&Value>,
        settings: Option<&Value>,
    ) -> Result<bool, OdmError> {
        if self.index_exists(index).await? {
            return Err(OdmError::already_exists(format!(
                "'{}' index already exists",
                index
            )));
        }

        let mut body = json!({});
        if let Some(mappings) = mappings.filter(|m| !is_empty_json(m)) {
            let mut mappings = mappings.clone();
            prune_non_text_options(&mut mappings);
            body["mappings"] = mappings;
        }
        if let Some(settings) = settings.filter(|s| !is_empty_json(s)) {
            body["settings"] = settings.clone();
        }

        let (status, response) = self
            .request(Method::Put, &Self::path(&[index])?, &QueryPairs::new(), Some(body))
            .await?;

        let acknowledged = Self::acknowledged("create_index", status, &response);
        info!(index = %index, acknowledged, "Created index");
        Ok(acknowledged)
    }

    async fn create_type(
        &self,
        index: &str,
        type_name: &str,
        mappings: &Value,
    ) -> Result<bool, OdmError> {
        if !self.index_exists(index).await? {
            return Err(OdmError::not_found(format!(
                "'{}' index does not exist",
                index
            )));
        }
        if self.type_exists(index, type_name).await? {
            return Err(OdmError::already_exists(format!(
                "type '{}' already exists on index '{}'",
                type_name, index
            )));
        }

        let mut mappings = mappings.clone();
        prune_non_text_options(&mut mappings);

        let (status, response) = self
            .request(
                Method::Put,
                &Self::path(&[index, "_mapping", type_name])?,
                &QueryPairs::new(),
                Some(mappings),
            )
            .await?;

        let acknowledged = Self::acknowledged("create_type", status, &response);
        info!(index = %index, type_name = %type_name, acknowledged, "Created type");
        Ok(acknowledged)
    }

    async fn delete_index(&self, index: &str) -> Result<bool, OdmError> {
        if is_wildcard_index(index) {
            warn!(index = %index, "Refusing to delete a wildcard index target");
            return Ok(false);
        }

        if !self.index_exists(index).await? {
            return Err(OdmError::not_found(format!(
                "'{}' index does not exist",
                index
            )));
        }

        let (status, response) = self
            .request(Method::Delete, &Self::path(&[index])?, &QueryPairs::new(), None)
            .await?;

        let acknowledged = Self::acknowledged("delete_index", status, &response);
        info!(index = %index, acknowledged, "Deleted index");
        Ok(acknowledged)
    }

    async fn insert(
        &self,
        index: &str,
        type_name: &str,
        body: &FieldValueSet,
        params: &InsertParams,
    ) -> Result<WriteResponse, OdmError> {
        if !self.index_exists(index).await? {
            warn!(index = %index, "Index does not exist at insert attempt");
            return Ok(WriteResponse::missing_schema());
        }
        if !self.type_exists(index, type_name).await? {
            warn!(index = %index, type_name = %type_name, "Type does not exist at insert attempt");
            return Ok(WriteResponse::missing_schema());
        }

        let mut query = vec![("op_type", "create".to_string()), self.refresh_param(params.refresh)];
        if let Some(routing) = &params.routing {
            query.push(("routing", routing.clone()));
        }

        let (method, path) = match &params.id {
            Some(id) => (Method::Put, Self::path(&[index, type_name, id.as_str()])?),
            None => (Method::Post, Self::path(&[index, type_name])?),
        };

        let (status, response) = self
            .request(method, &path, &query, Some(Value::Object(body.clone())))
            .await?;

        let success = Self::insert_succeeded(status, &response);
        if success {
            debug!(index = %index, type_name = %type_name, id = ?response.get("_id"), "Document created");
        } else {
            error!(status = %status, body = %response, "Insert request failed");
        }
        Ok(WriteResponse::new(success, response))
    }

    async fn update(
        &self,
        index: &str,
        type_name: &str,
        id: &str,
        partial: &FieldValueSet,
        params: &UpdateParams,
    ) -> Result<WriteResponse, OdmError> {
        if !self.index_exists(index).await? {
            warn!(index = %index, "Index does not exist at update attempt");
            return Ok(WriteResponse::missing_schema());
        }

        let mut query = vec![self.refresh_param(params.refresh)];
        if let Some(retries) = params.retry_on_conflict {
            query.push(("retry_on_conflict", retries.to_string()));
        }

        let mut body = json!({ "doc": Value::Object(partial.clone()) });
        if let Some(extra) = &params.extra_body {
            deep_merge(&mut body, extra.clone());
        }

        let (status, response) = self
            .request(
                Method::Post,
                &Self::path(&[index, type_name, id, "_update"])?,
                &query,
                Some(body),
            )
            .await?;

        let success = Self::update_succeeded(status, &response);
        if success {
            debug!(index = %index, type_name = %type_name, id = %id, "Document updated");
        } else {
            error!(status = %status, body = %response, "Update request failed");
        }
        Ok(WriteResponse::new(success, response))
    }

    async fn delete(
        &self,
        index: &str,
        type_name: &str,
        id: &str,
        params: &DeleteParams,
    ) -> Result<WriteResponse, OdmError> {
        if !self.index_exists(index).await? {
            warn!(index = %index, "Index does not exist at delete attempt");
            return Ok(WriteResponse::missing_schema());
        }

        let mut query = vec![self.refresh_param(params.refresh)];
        if let Some(routing) = &params.routing {
            query.push(("routing", routing.clone()));
        }

        let (status, response) = self
            .request(
                Method::Delete,
                &Self::path(&[index, type_name, id])?,
                &query,
                None,
            )
            .await?;

        let success = Self::delete_succeeded(status, &response);
        if success {
            debug!(index = %index, type_name = %type_name, id = %id, "Document deleted");
        } else {
            error!(status = %status, body = %response, "Delete request failed");
        }
        Ok(WriteResponse::new(success, response))
    }

    async fn get(
        &self,
        index: &str,
        type_name: &str,
        id: &str,
        params: &GetParams,
    ) -> Result<Option<Value>, OdmError> {
        if !self.index_exists(index).await? {
            return Ok(None);
        }

        let path = Self::path(&[index, type_name, id])?;
        let mut exists_query = vec![self.refresh_param(None)];
        if let Some(routing) = &params.routing {
            exists_query.push(("routing", routing.clone()));
        }

        if !self.exists(&path, &exists_query).await? {
            return Ok(None);
        }

        let mut query = exists_query;
        query.push(("_source", params.source.unwrap_or(true).to_string()));
        if !params.source_excludes.is_empty() {
            query.push(("_source_excludes", params.source_excludes.join(",")));
        }

        let (_, response) = self.request(Method::Get, &path, &query, None).await?;

        if response.get("found").and_then(Value::as_bool) == Some(true) {
            Ok(Some(response))
        } else {
            Ok(None)
        }
    }

    async fn search(
        &self,
        index: &str,
        type_name: &str,
        body: &Value,
        params: &SearchParams,
    ) -> Result<Value, OdmError> {
        if !self.index_exists(index).await? {
            return Ok(json!({}));
        }

        let mut query = vec![
            (
                "size",
                params.size.unwrap_or(self.config.max_results).to_string(),
            ),
            (
                "default_operator",
                params.default_operator.unwrap_or_default().as_str().to_string(),
            ),
            ("_source", params.source.unwrap_or(true).to_string()),
            (
                "request_cache",
                params.request_cache.unwrap_or(false).to_string(),
            ),
        ];
        if let Some(from) = params.from {
            query.push(("from", from.to_string()));
        }

        let mut body = body.clone();
        if let Some(extra) = &params.extra_body {
            deep_merge(&mut body, extra.clone());
        }

        let (status, response) = self
            .request(
                Method::Post,
                &Self::path(&[index, type_name, "_search"])?,
                &query,
                Some(body),
            )
            .await?;

        if !status.is_success() {
            error!(status = %status, body = %response, "Search request failed");
            return Err(OdmError::operation_failed("search", response));
        }

        Ok(response)
    }
}

fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
