use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::description::ComponentDescription;

/// A lookup table of shared component descriptions.
///
/// Callers build a registry from whatever libraries and documents they
/// have loaded and pass it explicitly to operations that need to resolve
/// description references.
#[derive(Clone, Debug, Default)]
pub struct DescriptionRegistry {
    descriptions: Vec<Arc<ComponentDescription>>,
    by_id: HashMap<String, usize>,
    by_guid: HashMap<Uuid, usize>,
    by_implements: HashMap<(String, String), usize>,
}

impl DescriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a description.
    ///
    /// A later registration with the same id, GUID or implemented type
    /// shadows the earlier one for that key.
    pub fn register(&mut self, description: Arc<ComponentDescription>) {
        let idx = self.descriptions.len();

        self.by_id.insert(description.id.clone(), idx);
        if !description.metadata.guid.is_nil() {
            self.by_guid.insert(description.metadata.guid, idx);
        }
        if let Some(implements) = &description.metadata.implements {
            self.by_implements
                .insert((implements.set.clone(), implements.item.clone()), idx);
        }

        self.descriptions.push(description);
    }

    /// Gets a description by its id.
    pub fn get(&self, id: &str) -> Option<&Arc<ComponentDescription>> {
        self.by_id.get(id).map(|&i| &self.descriptions[i])
    }

    /// Gets a description by its GUID.
    pub fn by_guid(&self, guid: &Uuid) -> Option<&Arc<ComponentDescription>> {
        self.by_guid.get(guid).map(|&i| &self.descriptions[i])
    }

    /// Gets the first description with the given name.
    pub fn by_name(&self, name: &str) -> Option<&Arc<ComponentDescription>> {
        self.descriptions.iter().find(|d| d.name == name)
    }

    /// Gets the description implementing `item` of `set`.
    pub fn by_implements(&self, set: &str, item: &str) -> Option<&Arc<ComponentDescription>> {
        self.by_implements
            .get(&(set.to_owned(), item.to_owned()))
            .map(|&i| &self.descriptions[i])
    }

    /// Iterates over all registered descriptions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ComponentDescription>> {
        self.descriptions.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}

impl FromIterator<Arc<ComponentDescription>> for DescriptionRegistry {
    fn from_iter<T: IntoIterator<Item = Arc<ComponentDescription>>>(iter: T) -> Self {
        let mut registry = Self::new();
        for description in iter {
            registry.register(description);
        }
        registry
    }
}
