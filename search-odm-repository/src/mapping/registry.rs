//! Per-type cache of resolved mapping descriptors.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use search_odm_shared::Document;
use tracing::debug;

use crate::errors::OdmError;
use crate::mapping::MappingDescriptor;

/// Resolves each entity type's mapping once and shares it afterwards.
///
/// Failed resolutions are not cached, so a broken declaration fails every
/// persister construction for that type.
#[derive(Debug, Default)]
pub struct MappingRegistry {
    descriptors: RwLock<HashMap<TypeId, Arc<MappingDescriptor>>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the descriptor for `E`, resolving and validating it on first use.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<MappingDescriptor>)` - The cached or freshly resolved descriptor
    /// * `Err(OdmError::MappingValidation)` - If `E::mapping()` is invalid
    pub fn descriptor<E: Document>(&self) -> Result<Arc<MappingDescriptor>, OdmError> {
        let key = TypeId::of::<E>();

        if let Some(descriptor) = self
            .descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(descriptor));
        }

        let descriptor = Arc::new(MappingDescriptor::resolve(type_name::<E>(), &E::mapping())?);
        debug!(
            entity = type_name::<E>(),
            index = descriptor.index_name(),
            type_name = descriptor.type_name(),
            "Resolved entity mapping"
        );

        let mut descriptors = self
            .descriptors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(descriptors.entry(key).or_insert(descriptor)))
    }

    /// Returns true if `E` has already been resolved.
    pub fn contains<E: Document>(&self) -> bool {
        self.descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<E>())
    }

    pub fn len(&self) -> usize {
        self.descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
