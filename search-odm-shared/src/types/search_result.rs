//! Search result types.
//!
//! The engine returns documents as JSON envelopes carrying meta fields
//! (`_id`, `_index`, `found`, ...) at the top level and the stored fields
//! under `_source`.

use serde_json::{Map, Value};

/// A raw document envelope returned by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    envelope: Map<String, Value>,
}

impl SearchResult {
    pub fn new(envelope: Map<String, Value>) -> Self {
        Self { envelope }
    }

    /// Wrap a JSON value. Returns `None` unless the value is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(envelope) => Some(Self { envelope }),
            _ => None,
        }
    }

    /// The document identifier, if the envelope carries one.
    pub fn id(&self) -> Option<&str> {
        self.envelope.get("_id").and_then(Value::as_str)
    }

    pub fn source(&self) -> Option<&Map<String, Value>> {
        self.envelope.get("_source").and_then(Value::as_object)
    }

    pub fn envelope(&self) -> &Map<String, Value> {
        &self.envelope
    }

    /// Flatten `_source` into the top level so fields and meta-fields share
    /// one namespace. Source fields win over top-level keys of the same name.
    pub fn merged(&self) -> Map<String, Value> {
        let mut merged = self.envelope.clone();
        if let Some(source) = self.source() {
            for (key, value) in source {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }
}

/// The hit list of a search response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    /// Total number of matching documents reported by the engine.
    pub total: u64,
    /// Returned hits, in engine order.
    pub hits: Vec<SearchResult>,
}

impl SearchHits {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read `hits.total` and `hits.hits` from a raw search response.
    ///
    /// Accepts both the numeric `total` and the `{"value": n}` object form.
    /// A response without a `hits` section yields an empty result.
    pub fn from_response(response: &Value) -> Self {
        let Some(section) = response.get("hits") else {
            return Self::empty();
        };

        let total = match section.get("total") {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
            Some(Value::Object(obj)) => obj.get("value").and_then(Value::as_u64).unwrap_or(0),
            _ => 0,
        };

        let hits = section
            .get("hits")
            .and_then(Value::as_array)
            .map(|hits| {
                hits.iter()
                    .cloned()
                    .filter_map(SearchResult::from_value)
                    .collect()
            })
            .unwrap_or_default();

        Self { total, hits }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
