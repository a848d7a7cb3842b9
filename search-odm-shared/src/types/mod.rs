//! This module defines the core data structures shared across the search ODM.
//! It re-exports the entity trait, mapping declarations and query types.

pub mod document;
pub mod mapping;
pub mod search_query;
pub mod search_result;

pub use document::Document;
pub use mapping::{FieldDeclaration, FieldKind, FieldValueSet, MappingDeclaration, TypeDeclaration};
pub use search_query::{OrderBy, SearchCriteria, SortOrder};
pub use search_result::{SearchHits, SearchResult};
