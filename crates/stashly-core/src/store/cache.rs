// ── Entity cache ──
//
// The map of entity-type name → collection. Replaced wholesale on each
// reduction; collections that a reduction did not touch keep their `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::collection::EntityCollection;

/// Immutable snapshot of every collection in the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityCache {
    collections: HashMap<String, Arc<EntityCollection>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity_name: &str) -> Option<&Arc<EntityCollection>> {
        self.collections.get(entity_name)
    }

    /// Copy of this cache with `entity_name` pointing at `collection`.
    /// Other entries are shared, not cloned.
    pub fn with_collection(&self, entity_name: &str, collection: Arc<EntityCollection>) -> Self {
        let mut collections = self.collections.clone();
        collections.insert(entity_name.to_owned(), collection);
        Self { collections }
    }

    /// Names of the collections created so far, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.collections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}
