//! Integration tests for the OpenSearch connection.
//!
//! These tests run the real OpenSearchConnection against a local axum server
//! that answers canned responses per method and path and records every
//! request it receives. Unrouted requests get an empty 404, which is what the
//! engine answers to existence checks on absent indices, types and documents.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};

use search_odm_repository::{
    ConnectionConfig, GetParams, InsertParams, OdmError, OpenSearchConnection, SearchConnection,
    SearchParams,
};
use search_odm_shared::FieldValueSet;

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: Method,
    path: String,
    query: String,
    body: Value,
}

// Canned search engine for testing
#[derive(Default)]
struct StubEngine {
    routes: HashMap<(Method, String), (StatusCode, Value)>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubEngine {
    fn new() -> Self {
        Self::default()
    }

    fn route(mut self, method: Method, path: &str, status: StatusCode, body: Value) -> Self {
        self.routes.insert((method, path.to_string()), (status, body));
        self
    }

    /// Answer 200 to a HEAD existence check on `path`.
    fn exists(self, path: &str) -> Self {
        self.route(Method::HEAD, path, StatusCode::OK, Value::Null)
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Every request other than an existence check.
    fn writes(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method != Method::HEAD)
            .collect()
    }
}

async fn handle(
    State(engine): State<Arc<StubEngine>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    engine.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    match engine.routes.get(&(method, uri.path().to_string())) {
        Some((status, Value::Null)) => (*status).into_response(),
        Some((status, body)) => (*status, Json(body.clone())).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn start(engine: StubEngine) -> (OpenSearchConnection, Arc<StubEngine>) {
    let engine = Arc::new(engine);
    let app = Router::new().fallback(handle).with_state(engine.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let connection =
        OpenSearchConnection::new(ConnectionConfig::new(format!("http://{}", addr))).unwrap();
    (connection, engine)
}

fn fields(value: Value) -> FieldValueSet {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_create_index_on_existing_index_fails() {
    let (connection, engine) = start(StubEngine::new().exists("/products")).await;

    let err = connection.create_index("products", None, None).await.unwrap_err();

    assert!(matches!(err, OdmError::AlreadyExists(_)));
    assert!(engine.writes().is_empty());
}

#[tokio::test]
async fn test_create_index_submits_pruned_mappings() {
    let (connection, engine) = start(StubEngine::new().route(
        Method::PUT,
        "/products",
        StatusCode::OK,
        json!({ "acknowledged": true }),
    ))
    .await;

    let mappings = json!({
        "item": { "properties": {
            "name": { "type": "text", "boost": 2 },
            "unit_price": { "type": "float", "index": true, "boost": 3 }
        } }
    });
    let settings = json!({ "number_of_shards": 1 });

    let acknowledged = connection
        .create_index("products", Some(&mappings), Some(&settings))
        .await
        .unwrap();
    assert!(acknowledged);

    let writes = engine.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].method, Method::PUT);
    assert_eq!(
        writes[0].body,
        json!({
            "mappings": { "item": { "properties": {
                "name": { "type": "text", "boost": 2 },
                "unit_price": { "type": "float" }
            } } },
            "settings": { "number_of_shards": 1 }
        })
    );
}

#[tokio::test]
async fn test_create_type_requires_index_and_absent_type() {
    let mappings = json!({ "item": { "properties": { "name": { "type": "text" } } } });

    let (connection, engine) = start(StubEngine::new()).await;
    let err = connection
        .create_type("products", "item", &mappings)
        .await
        .unwrap_err();
    assert!(matches!(err, OdmError::NotFound(_)));
    assert!(engine.writes().is_empty());

    let (connection, engine) = start(
        StubEngine::new()
            .exists("/products")
            .exists("/products/_mapping/item"),
    )
    .await;
    let err = connection
        .create_type("products", "item", &mappings)
        .await
        .unwrap_err();
    assert!(matches!(err, OdmError::AlreadyExists(_)));
    assert!(engine.writes().is_empty());

    let (connection, engine) = start(StubEngine::new().exists("/products").route(
        Method::PUT,
        "/products/_mapping/item",
        StatusCode::OK,
        json!({ "acknowledged": true }),
    ))
    .await;
    assert!(connection
        .create_type("products", "item", &mappings)
        .await
        .unwrap());
    assert_eq!(engine.writes()[0].body, mappings);
}

#[tokio::test]
async fn test_insert_soft_fails_on_missing_schema() {
    let body = fields(json!({ "name": "Widget" }));

    let (connection, engine) = start(StubEngine::new()).await;
    let response = connection
        .insert("products", "item", &body, &InsertParams::default())
        .await
        .unwrap();
    assert!(!response.is_success());
    assert_eq!(response.body, Value::Null);
    assert!(engine.writes().is_empty());

    let (connection, engine) = start(StubEngine::new().exists("/products")).await;
    let response = connection
        .insert("products", "item", &body, &InsertParams::default())
        .await
        .unwrap();
    assert!(!response.is_success());
    assert!(engine.writes().is_empty());
}

#[tokio::test]
async fn test_insert_creates_document_with_explicit_id() {
    let (connection, engine) = start(
        StubEngine::new()
            .exists("/products")
            .exists("/products/_mapping/item")
            .route(
                Method::PUT,
                "/products/item/42",
                StatusCode::CREATED,
                json!({ "_index": "products", "_id": "42", "result": "created" }),
            ),
    )
    .await;

    let response = connection
        .insert(
            "products",
            "item",
            &fields(json!({ "name": "Widget" })),
            &InsertParams::with_id("42"),
        )
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.body["_id"], json!("42"));

    let writes = engine.writes();
    assert_eq!(writes.len(), 1);
    assert!(writes[0].query.contains("op_type=create"));
    assert!(writes[0].query.contains("refresh=true"));
    assert_eq!(writes[0].body, json!({ "name": "Widget" }));
}

#[tokio::test]
async fn test_get_returns_document_only_when_found() {
    let (connection, engine) = start(
        StubEngine::new()
            .exists("/products")
            .exists("/products/item/1")
            .route(
                Method::GET,
                "/products/item/1",
                StatusCode::OK,
                json!({ "_id": "1", "found": false }),
            )
            .exists("/products/item/3")
            .route(
                Method::GET,
                "/products/item/3",
                StatusCode::OK,
                json!({ "_id": "3", "found": true, "_source": { "name": "Widget" } }),
            ),
    )
    .await;
    let params = GetParams::default();

    assert!(connection
        .get("products", "item", "1", &params)
        .await
        .unwrap()
        .is_none());

    // Absent documents are never fetched.
    assert!(connection
        .get("products", "item", "2", &params)
        .await
        .unwrap()
        .is_none());
    assert!(!engine
        .writes()
        .iter()
        .any(|request| request.path == "/products/item/2"));

    let found = connection
        .get("products", "item", "3", &params)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found["_source"]["name"], json!("Widget"));
}

#[tokio::test]
async fn test_search_on_missing_index_is_empty() {
    let (connection, engine) = start(StubEngine::new()).await;

    let response = connection
        .search(
            "products",
            "item",
            &json!({ "query": { "bool": { "must": [] } } }),
            &SearchParams::default(),
        )
        .await
        .unwrap();

    assert_eq!(response, json!({}));
    assert!(engine.writes().is_empty());
}

#[tokio::test]
async fn test_search_caps_size_by_default() {
    let (connection, engine) = start(StubEngine::new().exists("/products").route(
        Method::POST,
        "/products/item/_search",
        StatusCode::OK,
        json!({ "hits": { "total": 0, "hits": [] } }),
    ))
    .await;

    connection
        .search("products", "item", &json!({}), &SearchParams::default())
        .await
        .unwrap();

    let writes = engine.writes();
    assert!(writes[0].query.contains("size=10000"));
    assert!(writes[0].query.contains("default_operator=AND"));
}

#[tokio::test]
async fn test_delete_index_accepts_names_containing_all() {
    let (connection, engine) = start(StubEngine::new().exists("/my_allocations").route(
        Method::DELETE,
        "/my_allocations",
        StatusCode::OK,
        json!({ "acknowledged": true }),
    ))
    .await;

    assert!(connection.delete_index("my_allocations").await.unwrap());
    assert_eq!(engine.writes().len(), 1);

    let err = connection.delete_index("missing").await.unwrap_err();
    assert!(matches!(err, OdmError::NotFound(_)));
}
