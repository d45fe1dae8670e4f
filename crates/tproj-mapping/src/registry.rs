//! Per-type cache of discovered descriptors.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::descriptor::{FieldDescriptor, TypeInfo, discover};
use crate::error::DiscoveryError;

/// Caches descriptor lists per type so each type is discovered once.
///
/// Entries are looked up by name and checked against the registered static,
/// so two distinct types sharing a name are rejected instead of aliased.
/// Failed discoveries are not cached; asking again repeats the check and
/// returns the same error.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    cache: RwLock<HashMap<&'static str, Entry>>,
}

#[derive(Debug)]
struct Entry {
    info: &'static TypeInfo,
    descriptors: Arc<[FieldDescriptor]>,
}

impl Entry {
    fn descriptors_for(
        &self,
        info: &'static TypeInfo,
    ) -> Result<Arc<[FieldDescriptor]>, DiscoveryError> {
        if std::ptr::eq(self.info, info) {
            Ok(Arc::clone(&self.descriptors))
        } else {
            Err(DiscoveryError::DuplicateTypeName { name: info.name })
        }
    }
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptors for `info`, discovering them on first use.
    pub fn descriptors(
        &self,
        info: &'static TypeInfo,
    ) -> Result<Arc<[FieldDescriptor]>, DiscoveryError> {
        if let Some(found) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(info.name)
        {
            return found.descriptors_for(info);
        }

        let discovered: Arc<[FieldDescriptor]> = discover(info)?.into();
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache
            .entry(info.name)
            .or_insert(Entry {
                info,
                descriptors: discovered,
            })
            .descriptors_for(info)
    }

    /// Number of types discovered so far.
    pub fn len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDecl;
    use crate::value::FieldType;

    static NOTE: TypeInfo = TypeInfo::new(
        "Note",
        &[FieldDecl::new("body", FieldType::Text).single()],
    );
    static BROKEN: TypeInfo = TypeInfo::new(
        "Broken",
        &[FieldDecl::new("body", FieldType::Text).single().plural()],
    );

    #[test]
    fn caches_successful_discovery() {
        let registry = DescriptorRegistry::new();
        let first = registry.descriptors(&NOTE).unwrap();
        let second = registry.descriptors(&NOTE).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn second_type_with_a_taken_name_is_rejected() {
        static IMPOSTOR: TypeInfo = TypeInfo::new(
            "Note",
            &[FieldDecl::new("title", FieldType::Text).single()],
        );
        let registry = DescriptorRegistry::new();
        registry.descriptors(&NOTE).unwrap();
        assert_eq!(
            registry.descriptors(&IMPOSTOR).unwrap_err(),
            DiscoveryError::DuplicateTypeName { name: "Note" }
        );
        assert_eq!(registry.descriptors(&NOTE).unwrap().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn does_not_cache_failures() {
        let registry = DescriptorRegistry::new();
        assert!(registry.descriptors(&BROKEN).is_err());
        assert!(registry.descriptors(&BROKEN).is_err());
        assert!(registry.is_empty());
    }
}
