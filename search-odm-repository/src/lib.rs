//! # Search ODM Repository
//!
//! This crate maps typed entities onto documents of a search index. It
//! includes the mapping resolver, the entity hydrator, the search connection
//! abstraction with a concrete OpenSearch implementation, and the entity
//! persister that ties them together.

pub mod config;
pub mod errors;
pub mod hydrator;
pub mod interfaces;
pub mod mapping;
pub mod opensearch;
pub mod persister;
pub mod types;
pub mod utils;

pub use config::{ConnectionConfig, PersisterConfig};
pub use errors::OdmError;
pub use hydrator::EntityHydrator;
pub use interfaces::{LifecycleEvent, LifecycleListener, SearchConnection};
pub use mapping::{FieldBinding, MappingDescriptor, MappingRegistry};
pub use opensearch::OpenSearchConnection;
pub use persister::{EntityPersister, InsertTicket};
pub use types::{
    DefaultOperator, DeleteParams, GetParams, InsertParams, SearchParams, UpdateParams,
    WriteResponse,
};
