//! Mapping declarations for entity types.
//!
//! A declaration is the raw, unvalidated description an entity type gives of
//! its search index binding. The repository crate resolves it into a
//! validated descriptor once per entity type.

use serde_json::{Map, Value};

/// Name of the meta-field that carries the document identifier.
pub const ID_META_FIELD: &str = "_id";

/// Flat document body keyed by index field name.
pub type FieldValueSet = Map<String, Value>;

/// The kind of binding a property carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// An ordinary document field stored in `_source`.
    Field,
    /// A system field such as `_id`.
    MetaField,
}

/// Index and type the entity is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub index: String,
    pub name: String,
}

impl TypeDeclaration {
    /// Create a new type declaration.
    ///
    /// # Arguments
    ///
    /// * `index` - The index the documents live in
    /// * `name` - The document type within the index
    pub fn new(index: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            name: name.into(),
        }
    }

    /// Describe why this declaration is invalid, if it is.
    pub fn error_message(&self) -> Option<String> {
        if self.index.trim().is_empty() {
            return Some("index name cannot be empty".to_string());
        }
        if self.name.trim().is_empty() {
            return Some("type name cannot be empty".to_string());
        }
        None
    }

    /// Returns true if both the index and type names are usable.
    pub fn is_valid(&self) -> bool {
        self.error_message().is_none()
    }
}

/// Binding of one entity property to an index field or meta-field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclaration {
    /// Entity property name (the serde field name).
    pub property: String,
    /// Explicit index field name; defaults to the snake-cased property name.
    pub name: Option<String>,
    /// Index field type such as `text`, `keyword` or `integer`.
    pub field_type: Option<String>,
    /// Extra mapping options (`index`, `boost`, `analyzer`, ...).
    pub options: Map<String, Value>,
    pub kind: FieldKind,
}

impl FieldDeclaration {
    /// Declare an ordinary field of the given index type.
    pub fn field(property: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            name: None,
            field_type: Some(field_type.into()),
            options: Map::new(),
            kind: FieldKind::Field,
        }
    }

    /// Declare a meta-field binding. Use `named` to pick the system field.
    pub fn meta_field(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            name: None,
            field_type: None,
            options: Map::new(),
            kind: FieldKind::MetaField,
        }
    }

    /// Override the index field name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a mapping option for this field.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Everything an entity type declares about its search index mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingDeclaration {
    /// Type/index bindings. Exactly one is expected.
    pub types: Vec<TypeDeclaration>,
    /// Field and meta-field bindings in declaration order.
    pub fields: Vec<FieldDeclaration>,
    /// Properties that must be unique across stored documents.
    pub identifiers: Vec<String>,
}

impl MappingDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the entity to an index and type.
    pub fn with_type(mut self, declaration: TypeDeclaration) -> Self {
        self.types.push(declaration);
        self
    }

    /// Add a field or meta-field binding.
    pub fn with_field(mut self, declaration: FieldDeclaration) -> Self {
        self.fields.push(declaration);
        self
    }

    /// Mark a property as an identity whose value must be unique.
    pub fn with_identifier(mut self, property: impl Into<String>) -> Self {
        self.identifiers.push(property.into());
        self
    }

    /// Iterate over the declarations of one kind.
    pub fn fields_of(&self, kind: FieldKind) -> impl Iterator<Item = &FieldDeclaration> {
        self.fields.iter().filter(move |field| field.kind == kind)
    }
}
