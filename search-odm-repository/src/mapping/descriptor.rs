//! Validated mapping descriptors and the engine-facing schema they produce.

use std::collections::HashSet;

use search_odm_shared::{FieldDeclaration, FieldKind, MappingDeclaration, ID_META_FIELD};
use serde_json::{json, Map, Value};

use crate::errors::OdmError;
use crate::utils::{decamelize, is_text_type};

/// A resolved property binding.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBinding {
    /// Entity property name.
    pub property: String,
    /// Index field name.
    pub name: String,
    pub field_type: Option<String>,
    pub options: Map<String, Value>,
    pub kind: FieldKind,
}

impl FieldBinding {
    fn from_declaration(declaration: &FieldDeclaration) -> Self {
        let name = declaration
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| decamelize(&declaration.property));

        Self {
            property: declaration.property.clone(),
            name,
            field_type: declaration.field_type.clone(),
            options: declaration.options.clone(),
            kind: declaration.kind,
        }
    }

    /// Mapping entry for this field: its type plus every non-null option.
    fn schema(&self) -> Value {
        let mut entry = Map::new();
        let field_type = self.field_type.clone().unwrap_or_default();
        let nested = field_type == "nested";
        entry.insert("type".to_string(), Value::String(field_type));

        for (option, value) in &self.options {
            if value.is_null() || option == "type" || option == "name" {
                continue;
            }
            if nested && (option == "index" || option == "boost") {
                continue;
            }
            entry.insert(option.clone(), value.clone());
        }

        Value::Object(entry)
    }
}

/// Immutable, validated description of how an entity type maps onto the index.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingDescriptor {
    entity: String,
    index_name: String,
    type_name: String,
    fields: Vec<FieldBinding>,
    meta_fields: Vec<FieldBinding>,
    identifiers: Vec<String>,
}

impl MappingDescriptor {
    /// Validate a declaration and resolve it into a descriptor.
    ///
    /// # Arguments
    ///
    /// * `entity` - Entity type name, used in error messages
    /// * `declaration` - The declaration returned by `Document::mapping`
    ///
    /// # Returns
    ///
    /// * `Ok(MappingDescriptor)` - If the declaration is complete and consistent
    /// * `Err(OdmError::MappingValidation)` - Naming the missing or invalid declaration
    pub fn resolve(entity: &str, declaration: &MappingDeclaration) -> Result<Self, OdmError> {
        let type_declaration = match declaration.types.as_slice() {
            [] => {
                return Err(OdmError::mapping_validation(format!(
                    "type declaration is missing for {} entity",
                    entity
                )))
            }
            [single] => single,
            _ => {
                return Err(OdmError::mapping_validation(format!(
                    "{} entity declares more than one type",
                    entity
                )))
            }
        };

        if let Some(message) = type_declaration.error_message() {
            return Err(OdmError::mapping_validation(format!(
                "{} for {} entity",
                message, entity
            )));
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::new();
        let mut meta_fields = Vec::new();

        for field in &declaration.fields {
            if field.property.trim().is_empty() {
                return Err(OdmError::mapping_validation(format!(
                    "{} entity has a binding without a property name",
                    entity
                )));
            }
            if !seen.insert(field.property.as_str()) {
                return Err(OdmError::mapping_validation(format!(
                    "property '{}' is bound more than once in {} entity",
                    field.property, entity
                )));
            }

            let binding = FieldBinding::from_declaration(field);
            match binding.kind {
                FieldKind::Field => {
                    if !matches!(binding.field_type.as_deref(), Some(t) if !t.trim().is_empty()) {
                        return Err(OdmError::mapping_validation(format!(
                            "field '{}' has no type in {} entity",
                            binding.property, entity
                        )));
                    }
                    fields.push(binding);
                }
                FieldKind::MetaField => meta_fields.push(binding),
            }
        }

        match meta_fields
            .iter()
            .filter(|binding| binding.name == ID_META_FIELD)
            .count()
        {
            0 => {
                return Err(OdmError::mapping_validation(format!(
                    "{} metaField is missing in {} entity",
                    ID_META_FIELD, entity
                )))
            }
            1 => {}
            _ => {
                return Err(OdmError::mapping_validation(format!(
                    "{} metaField is bound more than once in {} entity",
                    ID_META_FIELD, entity
                )))
            }
        }

        for identifier in &declaration.identifiers {
            if !seen.contains(identifier.as_str()) {
                return Err(OdmError::mapping_validation(format!(
                    "identifier '{}' is not a mapped property of {} entity",
                    identifier, entity
                )));
            }
        }

        Ok(Self {
            entity: entity.to_string(),
            index_name: type_declaration.index.clone(),
            type_name: type_declaration.name.clone(),
            fields,
            meta_fields,
            identifiers: declaration.identifiers.clone(),
        })
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldBinding] {
        &self.fields
    }

    pub fn meta_fields(&self) -> &[FieldBinding] {
        &self.meta_fields
    }

    /// Bindings of one kind, in declaration order.
    pub fn bindings(&self, kind: FieldKind) -> &[FieldBinding] {
        match kind {
            FieldKind::Field => &self.fields,
            FieldKind::MetaField => &self.meta_fields,
        }
    }

    /// Properties whose values must be unique across documents.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Find the binding of an entity property. Fields shadow meta-fields.
    pub fn binding_for(&self, property: &str) -> Option<&FieldBinding> {
        self.fields
            .iter()
            .chain(self.meta_fields.iter())
            .find(|binding| binding.property == property)
    }

    /// Translate an entity property into its index field name.
    ///
    /// # Returns
    ///
    /// * `Ok(&str)` - The bound index field name
    /// * `Err(OdmError::InvalidParameters)` - If the property has no binding
    pub fn field_name_for(&self, property: &str) -> Result<&str, OdmError> {
        self.binding_for(property)
            .map(|binding| binding.name.as_str())
            .ok_or_else(|| {
                OdmError::invalid_parameters(format!(
                    "field/metafield for column '{}' doesn't exist in {} entity",
                    property, self.entity
                ))
            })
    }

    /// The meta-field binding that carries the document id.
    pub fn id_binding(&self) -> Option<&FieldBinding> {
        self.meta_fields
            .iter()
            .find(|binding| binding.name == ID_META_FIELD)
    }

    /// Type mapping submitted when the schema is created:
    /// `{type_name: {"properties": {field: {"type": ..., options...}}}}`.
    pub fn type_mappings(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|binding| (binding.name.clone(), binding.schema()))
            .collect();

        let mut mappings = Map::new();
        mappings.insert(
            self.type_name.clone(),
            json!({ "properties": Value::Object(properties) }),
        );
        Value::Object(mappings)
    }
}

/// Drop `index` and `boost` from every non-text field of a type mapping.
///
/// Expects the `{type_name: {"properties": {...}}}` shape produced by
/// `MappingDescriptor::type_mappings`; anything else is left untouched.
pub fn prune_non_text_options(mappings: &mut Value) {
    let Some(types) = mappings.as_object_mut() else {
        return;
    };

    for mapping in types.values_mut() {
        let Some(properties) = mapping
            .get_mut("properties")
            .and_then(Value::as_object_mut)
        else {
            continue;
        };

        for field in properties.values_mut() {
            let Some(field) = field.as_object_mut() else {
                continue;
            };
            let textual = field
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(is_text_type);
            if !textual {
                field.remove("index");
                field.remove("boost");
            }
        }
    }
}
