// ── Cache reducer ──
//
// Routes each operation to the collection named by its entity type,
// creating the collection on first reference, and writes the result back.
// Collections the operation does not address keep their `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use super::collection::{DefaultCollectionReducer, EntityCollectionReducer};
use super::interceptor::{EntityCollectionInterceptor, run_chain};
use crate::action::EntityOperation;
use crate::definition::EntityDefinitionService;
use crate::error::CoreError;
use crate::store::{EntityCache, EntityCollection};

/// Reduces operations into the whole [`EntityCache`].
pub struct EntityCacheReducer {
    definitions: Arc<EntityDefinitionService>,
    reducers: HashMap<String, Arc<dyn EntityCollectionReducer>>,
    interceptors: Vec<Arc<dyn EntityCollectionInterceptor>>,
}

impl std::fmt::Debug for EntityCacheReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut reducers: Vec<&String> = self.reducers.keys().collect();
        reducers.sort();
        f.debug_struct("EntityCacheReducer")
            .field("reducers", &reducers)
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

impl EntityCacheReducer {
    /// One default reducer per registered definition, wrapped by
    /// `interceptors` (first is outermost).
    pub fn new(
        definitions: Arc<EntityDefinitionService>,
        interceptors: Vec<Arc<dyn EntityCollectionInterceptor>>,
    ) -> Self {
        let mut reducers: HashMap<String, Arc<dyn EntityCollectionReducer>> = HashMap::new();
        for name in definitions.names() {
            if let Ok(def) = definitions.get_definition(&name) {
                reducers.insert(name, Arc::new(DefaultCollectionReducer::new(def)));
            }
        }
        Self {
            definitions,
            reducers,
            interceptors,
        }
    }

    pub fn definitions(&self) -> &Arc<EntityDefinitionService> {
        &self.definitions
    }

    /// Replace the reducer for `entity_name`. The last registration wins.
    pub fn register_reducer(
        &mut self,
        entity_name: impl AsRef<str>,
        reducer: Arc<dyn EntityCollectionReducer>,
    ) {
        self.reducers
            .insert(entity_name.as_ref().trim().to_owned(), reducer);
    }

    pub fn register_reducers(&mut self, reducers: HashMap<String, Arc<dyn EntityCollectionReducer>>) {
        for (name, reducer) in reducers {
            self.register_reducer(name, reducer);
        }
    }

    /// Apply `op` to `cache`.
    ///
    /// Fails with [`CoreError::UnknownEntityType`] when the name has neither
    /// a definition nor a registered reducer; the cache is left untouched.
    pub fn reduce(
        &self,
        cache: &Arc<EntityCache>,
        op: &EntityOperation,
    ) -> Result<Arc<EntityCache>, CoreError> {
        let name = op.entity_name();
        let reducer = self
            .reducers
            .get(name)
            .ok_or_else(|| CoreError::UnknownEntityType {
                entity_name: name.to_owned(),
            })?;

        let existing = cache.get(name).cloned();
        let collection = existing
            .clone()
            .unwrap_or_else(|| self.initial_state(name));

        let next = run_chain(&self.interceptors, reducer.as_ref(), Arc::clone(&collection), op)?;

        if existing.is_some() && Arc::ptr_eq(&next, &collection) {
            return Ok(Arc::clone(cache));
        }
        Ok(Arc::new(cache.with_collection(name, next)))
    }

    /// Initial state for `entity_name`; an empty collection for names that
    /// only have a custom reducer.
    pub fn initial_state(&self, entity_name: &str) -> Arc<EntityCollection> {
        self.definitions
            .get_definition(entity_name)
            .map_or_else(
                |_| Arc::new(EntityCollection::new(entity_name)),
                |def| def.initial_state(),
            )
    }
}
