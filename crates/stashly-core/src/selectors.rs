// ── Selectors ──
//
// Read-side projections of one collection over the latest cache snapshot.
// A collection that has not been created yet reads as its initial state.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::definition::EntityDefinition;
use crate::error::CoreError;
use crate::model::EntityKey;
use crate::store::{EntityCache, EntityCollection};

/// Reads one entity type out of the live cache.
#[derive(Clone)]
pub struct EntitySelectors {
    definition: Arc<EntityDefinition>,
    receiver: watch::Receiver<Arc<EntityCache>>,
}

impl std::fmt::Debug for EntitySelectors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySelectors")
            .field("entity_name", &self.definition.entity_name)
            .finish_non_exhaustive()
    }
}

impl EntitySelectors {
    pub(crate) fn new(
        definition: Arc<EntityDefinition>,
        receiver: watch::Receiver<Arc<EntityCache>>,
    ) -> Self {
        Self {
            definition,
            receiver,
        }
    }

    pub fn entity_name(&self) -> &str {
        &self.definition.entity_name
    }

    /// The collection in the latest snapshot.
    pub fn collection(&self) -> Arc<EntityCollection> {
        self.receiver
            .borrow()
            .get(&self.definition.entity_name)
            .cloned()
            .unwrap_or_else(|| self.definition.initial_state())
    }

    /// Entities in display order.
    pub fn entities(&self) -> Vec<Arc<Value>> {
        self.collection().entities_in_order()
    }

    pub fn entity_map(&self) -> HashMap<EntityKey, Arc<Value>> {
        self.collection().entities.clone()
    }

    pub fn keys(&self) -> Vec<EntityKey> {
        self.collection().ids.clone()
    }

    pub fn count(&self) -> usize {
        self.collection().len()
    }

    pub fn entity(&self, key: &EntityKey) -> Option<Arc<Value>> {
        self.collection().get(key).cloned()
    }

    pub fn filter(&self) -> String {
        self.collection().filter.clone()
    }

    /// Entities passed through the type's filter function with the current
    /// pattern. Without a filter function every entity passes.
    pub fn filtered_entities(&self) -> Vec<Arc<Value>> {
        let collection = self.collection();
        let entities = collection.entities_in_order();
        match &self.definition.filter_fn {
            Some(filter) => filter(&entities, &collection.filter),
            None => entities,
        }
    }

    pub fn loaded(&self) -> bool {
        self.collection().loaded
    }

    pub fn loading(&self) -> bool {
        self.collection().loading
    }

    pub fn original_values(&self) -> HashMap<EntityKey, Arc<Value>> {
        self.collection().original_values.clone()
    }

    /// Entities deserialized into `T`, in display order.
    pub fn entities_as<T: DeserializeOwned>(&self) -> Result<Vec<T>, CoreError> {
        self.entities()
            .iter()
            .map(|e| T::deserialize(&**e).map_err(CoreError::from))
            .collect()
    }

    /// One entity deserialized into `T`.
    pub fn entity_as<T: DeserializeOwned>(&self, key: &EntityKey) -> Result<Option<T>, CoreError> {
        self.entity(key)
            .map(|e| T::deserialize(&*e).map_err(CoreError::from))
            .transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::definition::EntityMetadata;
    use crate::store::EntityAdapter;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Hero {
        id: i64,
        name: String,
    }

    fn selectors_for(metadata: EntityMetadata, entities: &[Value]) -> EntitySelectors {
        let def = Arc::new(EntityDefinition::from_metadata(metadata));
        let mut col = EntityCollection::clone(&def.initial_state());
        let adapter: &EntityAdapter = &def.adapter;
        adapter.add_all(&mut col, entities);
        col.filter = "wind".into();
        let cache = EntityCache::new().with_collection(&def.entity_name, Arc::new(col));
        let (_tx, rx) = watch::channel(Arc::new(cache));
        EntitySelectors::new(def, rx)
    }

    fn heroes() -> Vec<Value> {
        vec![
            json!({ "id": 1, "name": "Windstorm" }),
            json!({ "id": 2, "name": "Magneta" }),
        ]
    }

    #[test]
    fn missing_collection_reads_as_initial_state() {
        let def = Arc::new(EntityDefinition::from_metadata(EntityMetadata::new("Villain")));
        let (_tx, rx) = watch::channel(Arc::new(EntityCache::new()));
        let sel = EntitySelectors::new(def, rx);
        assert_eq!(sel.count(), 0);
        assert!(!sel.loaded());
        assert_eq!(sel.collection().entity_name, "Villain");
    }

    #[test]
    fn projections_follow_collection() {
        let sel = selectors_for(EntityMetadata::new("Hero"), &heroes());
        assert_eq!(sel.count(), 2);
        assert_eq!(sel.keys(), vec![EntityKey::Num(1), EntityKey::Num(2)]);
        assert_eq!(sel.entity(&EntityKey::Num(2)).unwrap()["name"], "Magneta");
        assert_eq!(sel.entity_map().len(), 2);
        assert_eq!(sel.filter(), "wind");
        assert!(sel.original_values().is_empty());
        assert!(!sel.loading());
    }

    #[test]
    fn filtered_entities_apply_filter_fn() {
        let sel = selectors_for(EntityMetadata::new("Hero").filter_props(["name"]), &heroes());
        let filtered = sel.filtered_entities();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["id"], 1);

        let unfiltered = selectors_for(EntityMetadata::new("Hero"), &heroes());
        assert_eq!(unfiltered.filtered_entities().len(), 2);
    }

    #[test]
    fn typed_reads() {
        let sel = selectors_for(EntityMetadata::new("Hero"), &heroes());
        let typed: Vec<Hero> = sel.entities_as().unwrap();
        assert_eq!(typed[0], Hero { id: 1, name: "Windstorm".into() });
        assert_eq!(
            sel.entity_as::<Hero>(&EntityKey::Num(9)).unwrap(),
            None
        );
    }

    #[test]
    fn typed_read_of_wrong_shape_fails() {
        let sel = selectors_for(EntityMetadata::new("Hero"), &[json!({ "id": 1 })]);
        assert!(sel.entities_as::<Hero>().is_err());
    }
}
