//! Entity hydrator.
//!
//! Converts typed entities to flat field/value sets and back, using the
//! entity's serde representation as its property map and the mapping
//! descriptor to decide which properties participate and under what index
//! field name.

use std::sync::Arc;

use search_odm_shared::{FieldKind, FieldValueSet, SearchResult, ID_META_FIELD};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::OdmError;
use crate::mapping::MappingDescriptor;
use crate::utils::{id_as_number, value_as_id};

/// Mapping-driven converter between entities and document bodies.
#[derive(Debug, Clone)]
pub struct EntityHydrator {
    descriptor: Arc<MappingDescriptor>,
}

impl EntityHydrator {
    pub fn new(descriptor: Arc<MappingDescriptor>) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &MappingDescriptor {
        &self.descriptor
    }

    /// Every property of the entity keyed by property name.
    ///
    /// # Returns
    ///
    /// * `Ok(Map)` - The entity's serde representation
    /// * `Err(OdmError::SerializationError)` - If the entity does not serialize to an object
    pub fn extract_properties<E: Serialize>(
        &self,
        entity: &E,
    ) -> Result<Map<String, Value>, OdmError> {
        match serde_json::to_value(entity)? {
            Value::Object(properties) => Ok(properties),
            other => Err(OdmError::serialization(format!(
                "{} entity serialized to a non-object value: {}",
                self.descriptor.entity(),
                other
            ))),
        }
    }

    /// Values of the properties bound with `kind`, keyed by index field name.
    ///
    /// Missing and null properties are left out.
    pub fn extract<E: Serialize>(
        &self,
        entity: &E,
        kind: FieldKind,
    ) -> Result<FieldValueSet, OdmError> {
        let properties = self.extract_properties(entity)?;

        Ok(self
            .descriptor
            .bindings(kind)
            .iter()
            .filter_map(|binding| {
                properties
                    .get(&binding.property)
                    .filter(|value| !value.is_null())
                    .map(|value| (binding.name.clone(), value.clone()))
            })
            .collect())
    }

    /// Current value of one entity property, if present and non-null.
    pub fn property_value<E: Serialize>(
        &self,
        entity: &E,
        property: &str,
    ) -> Result<Option<Value>, OdmError> {
        let mut properties = self.extract_properties(entity)?;
        Ok(properties.remove(property).filter(|value| !value.is_null()))
    }

    /// The entity's document id, read through its `_id` meta-field binding.
    pub fn document_id<E: Serialize>(&self, entity: &E) -> Result<Option<String>, OdmError> {
        let meta = self.extract(entity, FieldKind::MetaField)?;
        Ok(meta.get(ID_META_FIELD).and_then(value_as_id))
    }

    /// Copy the values of a search result into the entity.
    ///
    /// `_source` is merged into the top level first. A generic pass then sets
    /// every property whose name appears in the result, followed by the field
    /// and meta-field bindings, so bindings override the generic match.
    /// Properties absent from the result keep their current value. If the
    /// merged values do not fit the entity type the entity is left unchanged.
    ///
    /// Meta-field strings that read as integers are retried as numbers when
    /// the entity rejects them, so integer ids survive the engine's string
    /// `_id`.
    pub fn hydrate<E: Serialize + DeserializeOwned>(
        &self,
        entity: &mut E,
        result: &SearchResult,
    ) -> Result<(), OdmError> {
        let merged = result.merged();
        let mut properties = self.extract_properties(entity)?;

        for (key, value) in &merged {
            if let Some(property) = properties.get_mut(key) {
                *property = value.clone();
            }
        }

        let mut numeric_meta = Vec::new();
        for kind in [FieldKind::Field, FieldKind::MetaField] {
            for binding in self.descriptor.bindings(kind) {
                let Some(value) = merged.get(&binding.name) else {
                    continue;
                };
                properties.insert(binding.property.clone(), value.clone());

                if kind == FieldKind::MetaField {
                    if let Some(number) = value.as_str().and_then(id_as_number) {
                        numeric_meta.push((binding.property.clone(), number));
                    }
                }
            }
        }

        let hydrated = match serde_json::from_value(Value::Object(properties.clone())) {
            Ok(hydrated) => hydrated,
            Err(e) if numeric_meta.is_empty() => return Err(e.into()),
            Err(e) => {
                properties.extend(numeric_meta);
                serde_json::from_value(Value::Object(properties)).map_err(|_| OdmError::from(e))?
            }
        };

        *entity = hydrated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_odm_shared::{FieldDeclaration, MappingDeclaration, TypeDeclaration};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Product {
        id: Option<String>,
        name: Option<String>,
        unit_price: Option<f64>,
        tags: Vec<String>,
        notes: Option<String>,
    }

    fn hydrator() -> EntityHydrator {
        let declaration = MappingDeclaration::new()
            .with_type(TypeDeclaration::new("products", "item"))
            .with_field(FieldDeclaration::field("name", "text"))
            .with_field(FieldDeclaration::field("unitPrice", "float"))
            .with_field(FieldDeclaration::field("tags", "keyword").named("labels"))
            .with_field(FieldDeclaration::meta_field("id").named("_id"));
        let descriptor = MappingDescriptor::resolve("Product", &declaration).unwrap();
        EntityHydrator::new(Arc::new(descriptor))
    }

    #[test]
    fn test_extract_fields_is_sparse() {
        let product = Product {
            name: Some("Widget".to_string()),
            tags: vec!["tools".to_string()],
            notes: Some("not mapped".to_string()),
            ..Product::default()
        };

        let fields = hydrator().extract(&product, FieldKind::Field).unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields["name"], json!("Widget"));
        assert_eq!(fields["labels"], json!(["tools"]));
        assert!(!fields.contains_key("unit_price"));
        assert!(!fields.contains_key("notes"));
    }

    #[test]
    fn test_extract_meta_fields_and_document_id() {
        let hydrator = hydrator();
        let product = Product {
            id: Some("123".to_string()),
            name: Some("Widget".to_string()),
            ..Product::default()
        };

        let meta = hydrator.extract(&product, FieldKind::MetaField).unwrap();
        assert_eq!(meta, json!({ "_id": "123" }).as_object().cloned().unwrap());
        assert_eq!(hydrator.document_id(&product).unwrap().as_deref(), Some("123"));
        assert_eq!(hydrator.document_id(&Product::default()).unwrap(), None);
    }

    #[test]
    fn test_property_value() {
        let product = Product {
            unit_price: Some(9.5),
            ..Product::default()
        };
        let hydrator = hydrator();
        assert_eq!(
            hydrator.property_value(&product, "unitPrice").unwrap(),
            Some(json!(9.5))
        );
        assert_eq!(hydrator.property_value(&product, "name").unwrap(), None);
    }

    #[test]
    fn test_hydrate_from_envelope() {
        let result = SearchResult::from_value(json!({
            "_index": "products",
            "_id": "abc",
            "found": true,
            "_source": { "name": "Widget", "unit_price": 4.25, "labels": ["a", "b"] }
        }))
        .unwrap();

        let mut product = Product {
            notes: Some("kept".to_string()),
            ..Product::default()
        };
        hydrator().hydrate(&mut product, &result).unwrap();

        assert_eq!(product.id.as_deref(), Some("abc"));
        assert_eq!(product.name.as_deref(), Some("Widget"));
        assert_eq!(product.unit_price, Some(4.25));
        assert_eq!(product.tags, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(product.notes.as_deref(), Some("kept"));
    }

    #[test]
    fn test_hydrate_generic_pass_matches_property_names() {
        // `notes` has no binding but shares its name with a result key.
        let result = SearchResult::from_value(json!({ "_id": "1", "notes": "generic" })).unwrap();
        let mut product = Product::default();
        hydrator().hydrate(&mut product, &result).unwrap();
        assert_eq!(product.notes.as_deref(), Some("generic"));
    }

    #[test]
    fn test_hydrate_rejects_mistyped_values_without_changes() {
        let result = SearchResult::from_value(json!({
            "_id": "1",
            "_source": { "name": "Widget", "unit_price": "not a number" }
        }))
        .unwrap();

        let mut product = Product {
            name: Some("Original".to_string()),
            ..Product::default()
        };
        let err = hydrator().hydrate(&mut product, &result).unwrap_err();

        assert!(matches!(err, OdmError::SerializationError(_)));
        assert_eq!(product.name.as_deref(), Some("Original"));
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Order {
        id: Option<u64>,
        total: Option<f64>,
    }

    fn order_hydrator() -> EntityHydrator {
        let declaration = MappingDeclaration::new()
            .with_type(TypeDeclaration::new("orders", "order"))
            .with_field(FieldDeclaration::field("total", "float"))
            .with_field(FieldDeclaration::meta_field("id").named("_id"));
        let descriptor = MappingDescriptor::resolve("Order", &declaration).unwrap();
        EntityHydrator::new(Arc::new(descriptor))
    }

    #[test]
    fn test_hydrate_integer_id_from_string() {
        let hydrator = order_hydrator();
        let order = Order {
            id: Some(5),
            total: Some(10.0),
        };
        assert_eq!(hydrator.document_id(&order).unwrap().as_deref(), Some("5"));

        let result = SearchResult::from_value(json!({
            "_id": "5",
            "_source": { "total": 10.0 }
        }))
        .unwrap();
        let mut restored = Order::default();
        hydrator.hydrate(&mut restored, &result).unwrap();
        assert_eq!(restored, order);
    }

    #[test]
    fn test_hydrate_non_numeric_id_into_integer_fails() {
        let result = SearchResult::from_value(json!({ "_id": "abc" })).unwrap();
        let mut order = Order::default();
        let err = order_hydrator().hydrate(&mut order, &result).unwrap_err();
        assert!(matches!(err, OdmError::SerializationError(_)));
        assert_eq!(order, Order::default());
    }

    #[test]
    fn test_string_ids_that_look_numeric_stay_strings() {
        let result = SearchResult::from_value(json!({ "_id": "42" })).unwrap();
        let mut product = Product::default();
        hydrator().hydrate(&mut product, &result).unwrap();
        assert_eq!(product.id.as_deref(), Some("42"));
    }

    #[test]
    fn test_extract_then_hydrate_round_trip() {
        let hydrator = hydrator();
        let original = Product {
            id: Some("42".to_string()),
            name: Some("Widget".to_string()),
            unit_price: Some(12.0),
            tags: vec!["x".to_string()],
            notes: None,
        };

        let mut envelope = hydrator.extract(&original, FieldKind::MetaField).unwrap();
        envelope.insert(
            "_source".to_string(),
            Value::Object(hydrator.extract(&original, FieldKind::Field).unwrap()),
        );

        let mut restored = Product::default();
        hydrator
            .hydrate(&mut restored, &SearchResult::new(envelope))
            .unwrap();
        assert_eq!(restored, original);
    }
}
