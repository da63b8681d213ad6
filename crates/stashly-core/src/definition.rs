// ── Entity definitions ──
//
// Per-type metadata (key selection, ordering, filtering, extra state) and
// the explicit registry the controller is built from. There is no ambient
// lookup: an unregistered name is a configuration error.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::action::EntityActionGuard;
use crate::error::CoreError;
use crate::model::{DEFAULT_ID_FIELD, EntityKey, IdSelector, SortComparer, select_id_by_field, sort_by_field};
use crate::store::{EntityAdapter, EntityCollection};
use crate::stream::{EntityFilterFn, props_filter};

/// Prefix of the client-side keys stamped on optimistically added entities.
pub const TEMP_KEY_PREFIX: &str = "tmp-";

/// `true` for keys minted by [`EntityDefinition::assign_temp_key`].
pub fn is_temp_key(key: &EntityKey) -> bool {
    key.as_str().is_some_and(|s| s.starts_with(TEMP_KEY_PREFIX))
}

// ── EntityMetadata ───────────────────────────────────────────────────

/// Builder-style description of one entity type.
#[derive(Clone)]
pub struct EntityMetadata {
    pub entity_name: String,
    pub select_id: Option<IdSelector>,
    /// Field holding the key. Needed to stamp tentative keys; cleared when
    /// a custom selector replaces the field lookup.
    pub id_field: Option<String>,
    pub sort_comparer: Option<SortComparer>,
    pub filter_fn: Option<EntityFilterFn>,
    pub additional_collection_state: Option<Map<String, Value>>,
}

impl std::fmt::Debug for EntityMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMetadata")
            .field("entity_name", &self.entity_name)
            .field("id_field", &self.id_field)
            .field("custom_select_id", &self.select_id.is_some())
            .field("sorted", &self.sort_comparer.is_some())
            .field("filtered", &self.filter_fn.is_some())
            .field("additional_collection_state", &self.additional_collection_state)
            .finish()
    }
}

impl EntityMetadata {
    pub fn new(entity_name: impl AsRef<str>) -> Self {
        Self {
            entity_name: entity_name.as_ref().trim().to_owned(),
            select_id: None,
            id_field: Some(DEFAULT_ID_FIELD.to_owned()),
            sort_comparer: None,
            filter_fn: None,
            additional_collection_state: None,
        }
    }

    /// Read keys from `field` instead of `id`.
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.select_id = Some(select_id_by_field(field.clone()));
        self.id_field = Some(field);
        self
    }

    /// Custom key selector. Tentative keys are unavailable afterwards, so
    /// optimistic adds must carry their own key.
    pub fn with_select_id(mut self, select_id: IdSelector) -> Self {
        self.select_id = Some(select_id);
        self.id_field = None;
        self
    }

    pub fn with_sort_comparer(mut self, cmp: SortComparer) -> Self {
        self.sort_comparer = Some(cmp);
        self
    }

    pub fn sort_by(self, field: impl Into<String>) -> Self {
        self.with_sort_comparer(sort_by_field(field))
    }

    pub fn with_filter_fn(mut self, filter_fn: EntityFilterFn) -> Self {
        self.filter_fn = Some(filter_fn);
        self
    }

    /// Filter on these string properties with [`props_filter`].
    pub fn filter_props<I, S>(self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_filter_fn(props_filter(props))
    }

    pub fn with_additional_state(mut self, state: Map<String, Value>) -> Self {
        self.additional_collection_state = Some(state);
        self
    }
}

// ── EntityDefinition ─────────────────────────────────────────────────

/// Everything the engine needs to handle one entity type.
#[derive(Clone)]
pub struct EntityDefinition {
    pub entity_name: String,
    pub select_id: IdSelector,
    pub id_field: Option<String>,
    pub adapter: EntityAdapter,
    pub filter_fn: Option<EntityFilterFn>,
    pub guard: EntityActionGuard,
    initial_state: Arc<EntityCollection>,
}

impl std::fmt::Debug for EntityDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityDefinition")
            .field("entity_name", &self.entity_name)
            .field("id_field", &self.id_field)
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

impl EntityDefinition {
    pub fn from_metadata(metadata: EntityMetadata) -> Self {
        let select_id = metadata.select_id.unwrap_or_else(|| {
            select_id_by_field(
                metadata
                    .id_field
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ID_FIELD.to_owned()),
            )
        });
        let initial = EntityCollection::new(metadata.entity_name.clone())
            .with_additional(metadata.additional_collection_state.unwrap_or_default());

        Self {
            adapter: EntityAdapter::new(Arc::clone(&select_id), metadata.sort_comparer),
            guard: EntityActionGuard::new(Arc::clone(&select_id)),
            entity_name: metadata.entity_name,
            select_id,
            id_field: metadata.id_field,
            filter_fn: metadata.filter_fn,
            initial_state: Arc::new(initial),
        }
    }

    /// Fresh state for a new or reset collection. Shares one allocation
    /// until the first mutation.
    pub fn initial_state(&self) -> Arc<EntityCollection> {
        Arc::clone(&self.initial_state)
    }

    pub fn select_id(&self, entity: &Value) -> Option<EntityKey> {
        (self.select_id)(entity)
    }

    /// Key of `entity`, stamping a tentative `tmp-<uuid>` key into the id
    /// field when it has none. Returns `None` if the entity is not an
    /// object or the type has no id field to stamp.
    pub fn assign_temp_key(&self, entity: &mut Value) -> Option<EntityKey> {
        if let Some(key) = self.select_id(entity) {
            return Some(key);
        }
        let field = self.id_field.as_ref()?;
        let object = entity.as_object_mut()?;
        let key = EntityKey::Str(format!("{TEMP_KEY_PREFIX}{}", Uuid::new_v4()));
        object.insert(field.clone(), key.to_value());
        Some(key)
    }

    /// Copy of `entity` without a tentative key, ready to send to a server.
    pub fn strip_temp_key(&self, entity: &Value) -> Value {
        let mut entity = entity.clone();
        let Some(field) = &self.id_field else {
            return entity;
        };
        if self.select_id(&entity).is_some_and(|k| is_temp_key(&k)) {
            if let Some(object) = entity.as_object_mut() {
                object.remove(field);
            }
        }
        entity
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// Registry of entity definitions keyed by entity-type name.
#[derive(Debug, Clone, Default)]
pub struct EntityDefinitionService {
    definitions: HashMap<String, Arc<EntityDefinition>>,
}

impl EntityDefinitionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding one definition per metadata entry.
    pub fn from_metadata(metadata: impl IntoIterator<Item = EntityMetadata>) -> Self {
        let mut service = Self::new();
        service.register_metadata_many(metadata);
        service
    }

    /// Register (or replace) the definition for `metadata.entity_name`.
    pub fn register_metadata(&mut self, metadata: EntityMetadata) {
        self.register_definition(EntityDefinition::from_metadata(metadata));
    }

    pub fn register_metadata_many(&mut self, metadata: impl IntoIterator<Item = EntityMetadata>) {
        for m in metadata {
            self.register_metadata(m);
        }
    }

    pub fn register_definition(&mut self, definition: EntityDefinition) {
        self.definitions
            .insert(definition.entity_name.clone(), Arc::new(definition));
    }

    pub fn get_definition(&self, entity_name: &str) -> Result<Arc<EntityDefinition>, CoreError> {
        self.definitions
            .get(entity_name.trim())
            .cloned()
            .ok_or_else(|| CoreError::UnknownEntityType {
                entity_name: entity_name.trim().to_owned(),
            })
    }

    pub fn contains(&self, entity_name: &str) -> bool {
        self.definitions.contains_key(entity_name.trim())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.definitions.keys().cloned().collect();
        names.sort();
        names
    }
}
