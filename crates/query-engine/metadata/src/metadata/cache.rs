//! A cache of entity descriptors keyed by the entity's type.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;

use super::database::EntityDescriptor;

/// Descriptors computed once per type and shared afterwards.
///
/// Descriptors are computed outside the map and published with first-write-wins, so racing
/// first uses of a type all observe the same published descriptor.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    descriptors: DashMap<TypeId, Arc<EntityDescriptor>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the descriptor for `T`, computing it with `describe` on first use.
    pub fn get_or_compute<T: 'static>(
        &self,
        describe: impl FnOnce() -> EntityDescriptor,
    ) -> Arc<EntityDescriptor> {
        let type_id = TypeId::of::<T>();
        if let Some(descriptor) = self.descriptors.get(&type_id) {
            return Arc::clone(descriptor.value());
        }
        let computed = Arc::new(describe());
        Arc::clone(self.descriptors.entry(type_id).or_insert(computed).value())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Forget every descriptor.
    pub fn clear(&self) {
        self.descriptors.clear();
    }
}
