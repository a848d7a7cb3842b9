//! The entity trait implemented by every type persisted through the ODM.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::mapping::MappingDeclaration;

/// An entity type that can be stored as a search-index document.
///
/// Properties are read and written through the type's serde representation,
/// so the serde field names are the entity property names referenced by the
/// mapping declaration. New instances are built with `Default` before being
/// hydrated from search results.
///
/// # Example
///
/// ```
/// use search_odm_shared::{Document, FieldDeclaration, MappingDeclaration, TypeDeclaration};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// struct Product {
///     id: Option<String>,
///     name: Option<String>,
/// }
///
/// impl Document for Product {
///     fn mapping() -> MappingDeclaration {
///         MappingDeclaration::new()
///             .with_type(TypeDeclaration::new("products", "item"))
///             .with_field(FieldDeclaration::field("name", "text"))
///             .with_field(FieldDeclaration::meta_field("id").named("_id"))
///     }
/// }
///
/// assert_eq!(Product::mapping().fields.len(), 2);
/// ```
pub trait Document: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static {
    /// Declare how this entity maps onto a search index type.
    fn mapping() -> MappingDeclaration;
}
