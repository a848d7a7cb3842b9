//! # Search ODM Shared
//!
//! This crate defines the declarative types shared between entity definitions
//! and the search ODM repository: the `Document` trait an entity implements,
//! the mapping declarations it returns, and the criteria/result types that
//! flow through the persister.

pub mod types;

pub use types::document::Document;
pub use types::mapping::{
    FieldDeclaration, FieldKind, FieldValueSet, MappingDeclaration, TypeDeclaration, ID_META_FIELD,
};
pub use types::search_query::{OrderBy, SearchCriteria, SortOrder};
pub use types::search_result::{SearchHits, SearchResult};
