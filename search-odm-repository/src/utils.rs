//! Utility functions for the search ODM repository.

use convert_case::{Case, Casing};
use serde_json::Value;

/// Field types whose `index`/`boost` options the engine accepts.
pub const TEXT_FIELD_TYPES: [&str; 3] = ["string", "text", "keyword"];

/// Index field name derived from an entity property name.
///
/// # Example
///
/// ```
/// use search_odm_repository::utils::decamelize;
///
/// assert_eq!(decamelize("createdAt"), "created_at");
/// assert_eq!(decamelize("name"), "name");
/// ```
pub fn decamelize(property: &str) -> String {
    // Leading underscores mark system fields (`_id`) and must survive.
    let trimmed = property.trim_start_matches('_');
    let prefix = &property[..property.len() - trimmed.len()];
    if trimmed.is_empty() {
        return property.to_string();
    }
    format!("{}{}", prefix, trimmed.to_case(Case::Snake))
}

/// Returns true if the mapping type accepts `index` and `boost` options.
pub fn is_text_type(field_type: &str) -> bool {
    TEXT_FIELD_TYPES.contains(&field_type)
}

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key, arrays concatenate (base entries first) and any
/// other overlay value replaces the base value.
///
/// # Example
///
/// ```
/// use search_odm_repository::utils::deep_merge;
/// use serde_json::json;
///
/// let mut body = json!({ "query": { "bool": { "must": [{ "match": { "a": 1 } }] } } });
/// deep_merge(&mut body, json!({ "query": { "bool": { "must": [{ "match": { "b": 2 } }] } } }));
/// assert_eq!(body["query"]["bool"]["must"].as_array().unwrap().len(), 2);
/// ```
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(base_items), Value::Array(overlay_items)) => {
            base_items.extend(overlay_items);
        }
        (base, overlay) => *base = overlay,
    }
}

/// Render a JSON scalar as a document id.
///
/// Strings are used as-is and numbers are rendered; anything else is not an id.
pub fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a document id back into a JSON integer.
///
/// The engine always returns `_id` as a string; entities with integer ids
/// need it as a number again.
pub fn id_as_number(id: &str) -> Option<Value> {
    id.parse::<u64>()
        .map(Value::from)
        .or_else(|_| id.parse::<i64>().map(Value::from))
        .ok()
}

/// Returns true if an index target would address every index: any `*`, or
/// an `_all` entry in a comma-separated target list.
pub fn is_wildcard_index(index: &str) -> bool {
    index.contains('*') || index.split(',').any(|target| target.trim() == "_all")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decamelize() {
        assert_eq!(decamelize("firstName"), "first_name");
        assert_eq!(decamelize("already_snake"), "already_snake");
        assert_eq!(decamelize("_id"), "_id");
        assert_eq!(decamelize("_parentId"), "_parent_id");
    }

    #[test]
    fn test_is_text_type() {
        assert!(is_text_type("text"));
        assert!(is_text_type("keyword"));
        assert!(is_text_type("string"));
        assert!(!is_text_type("integer"));
        assert!(!is_text_type("nested"));
    }

    #[test]
    fn test_deep_merge_overrides_scalars() {
        let mut base = json!({ "size": 10000, "refresh": true });
        deep_merge(&mut base, json!({ "size": 5 }));
        assert_eq!(base, json!({ "size": 5, "refresh": true }));
    }

    #[test]
    fn test_deep_merge_nested_objects_and_arrays() {
        let mut base = json!({
            "doc": { "name": "Widget" },
            "query": { "bool": { "must": [{ "match": { "name": "Widget" } }] } }
        });
        deep_merge(
            &mut base,
            json!({
                "doc": { "color": "red" },
                "doc_as_upsert": true,
                "query": { "bool": { "must": [{ "match": { "color": "red" } }] } }
            }),
        );

        assert_eq!(base["doc"], json!({ "name": "Widget", "color": "red" }));
        assert_eq!(base["doc_as_upsert"], json!(true));
        assert_eq!(base["query"]["bool"]["must"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_value_as_id() {
        assert_eq!(value_as_id(&json!("abc")), Some("abc".to_string()));
        assert_eq!(value_as_id(&json!(123)), Some("123".to_string()));
        assert_eq!(value_as_id(&json!("")), None);
        assert_eq!(value_as_id(&Value::Null), None);
        assert_eq!(value_as_id(&json!({ "a": 1 })), None);
    }

    #[test]
    fn test_is_wildcard_index() {
        assert!(is_wildcard_index("*"));
        assert!(is_wildcard_index("prod*"));
        assert!(is_wildcard_index("_all"));
        assert!(is_wildcard_index("products,_all"));
        assert!(!is_wildcard_index("products"));
        assert!(!is_wildcard_index("my_allocations"));
        assert!(!is_wildcard_index("sales_all_v2"));
    }

    #[test]
    fn test_id_as_number() {
        assert_eq!(id_as_number("5"), Some(json!(5)));
        assert_eq!(id_as_number("-12"), Some(json!(-12)));
        assert_eq!(id_as_number("abc"), None);
        assert_eq!(id_as_number("1.5"), None);
    }
}
