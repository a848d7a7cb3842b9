//! Mapping resolution.
//!
//! Entity types declare their index binding through `Document::mapping`.
//! This module validates those declarations into immutable descriptors and
//! caches them per entity type.

mod descriptor;
mod registry;

pub use descriptor::{prune_non_text_options, FieldBinding, MappingDescriptor};
pub use registry::MappingRegistry;
