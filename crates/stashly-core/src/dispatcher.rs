// ── Entity dispatcher ──
//
// Turns high-level commands for one entity type into operations and
// submits them. Every command submits exactly one operation and returns
// it, so callers can wait for its completion on the action stream.
// Save commands validate their payload before anything is submitted;
// cache-only commands trust the caller.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::action::{EntityOp, EntityOperation, EntityPayload, QueryParams};
use crate::config::DispatcherOptions;
use crate::definition::EntityDefinition;
use crate::error::CoreError;
use crate::model::{EntityKey, Update};

/// Accepts operations for reduction and persistence.
pub trait OperationSink: Send + Sync {
    /// Submit `op`. Returns the shared operation as reduced, which
    /// completions reference as their origin.
    fn dispatch(&self, op: EntityOperation) -> Result<Arc<EntityOperation>, CoreError>;
}

/// Either an entity (whose key is extracted) or a bare key.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityOrKey {
    Entity(Value),
    Key(EntityKey),
}

impl From<EntityKey> for EntityOrKey {
    fn from(key: EntityKey) -> Self {
        Self::Key(key)
    }
}

impl From<Value> for EntityOrKey {
    fn from(entity: Value) -> Self {
        Self::Entity(entity)
    }
}

impl From<i64> for EntityOrKey {
    fn from(key: i64) -> Self {
        Self::Key(EntityKey::Num(key))
    }
}

impl From<i32> for EntityOrKey {
    fn from(key: i32) -> Self {
        Self::Key(EntityKey::from(key))
    }
}

impl From<&str> for EntityOrKey {
    fn from(key: &str) -> Self {
        Self::Key(EntityKey::from(key))
    }
}

impl From<String> for EntityOrKey {
    fn from(key: String) -> Self {
        Self::Key(EntityKey::Str(key))
    }
}

/// Command front-end for one entity type.
#[derive(Clone)]
pub struct EntityDispatcher {
    definition: Arc<EntityDefinition>,
    options: DispatcherOptions,
    sink: Arc<dyn OperationSink>,
}

impl std::fmt::Debug for EntityDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityDispatcher")
            .field("entity_name", &self.definition.entity_name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl EntityDispatcher {
    pub fn new(
        definition: Arc<EntityDefinition>,
        options: DispatcherOptions,
        sink: Arc<dyn OperationSink>,
    ) -> Self {
        Self {
            definition,
            options,
            sink,
        }
    }

    pub fn entity_name(&self) -> &str {
        &self.definition.entity_name
    }

    pub fn options(&self) -> DispatcherOptions {
        self.options
    }

    /// Build an operation for this entity type without submitting it.
    pub fn create_entity_operation(&self, op: EntityOp, payload: EntityPayload) -> EntityOperation {
        EntityOperation::new(self.entity_name(), op, payload)
    }

    /// Convert a partial entity into an [`Update`] keyed by its own key.
    pub fn to_update<T: Serialize + ?Sized>(&self, partial: &T) -> Result<Update, CoreError> {
        let partial = self.to_json(partial, "UPDATE")?;
        Update::from_partial(partial, &self.definition.select_id)
            .ok_or_else(|| self.invalid("UPDATE", "partial entity has no key"))
    }

    // ── Persistence commands ─────────────────────────────────────────

    /// Save a new entity. Optimistic adds enter the cache at once, under a
    /// tentative key if the entity has none.
    pub fn add<T: Serialize + ?Sized>(
        &self,
        entity: &T,
        optimistic: Option<bool>,
    ) -> Result<Arc<EntityOperation>, CoreError> {
        let optimistic = optimistic.unwrap_or(self.options.optimistic_add);
        let mut entity = self.to_json(entity, "SAVE_ADD_ONE")?;

        if !optimistic {
            return self.submit(EntityOp::SaveAddOne, EntityPayload::Entity(entity));
        }

        if self.definition.assign_temp_key(&mut entity).is_none() {
            return Err(self.invalid(
                EntityOp::SaveAddOneOptimistic.as_str(),
                "optimistic add requires an entity with a key",
            ));
        }
        let op = self.create_entity_operation(EntityOp::SaveAddOneOptimistic, EntityPayload::Entity(entity));
        self.definition.guard.must_be_entity(&op)?;
        self.sink.dispatch(op)
    }

    /// Delete by entity or key.
    pub fn delete(
        &self,
        target: impl Into<EntityOrKey>,
        optimistic: Option<bool>,
    ) -> Result<Arc<EntityOperation>, CoreError> {
        let optimistic = optimistic.unwrap_or(self.options.optimistic_delete);
        let kind = if optimistic {
            EntityOp::SaveDeleteOneOptimistic
        } else {
            EntityOp::SaveDeleteOne
        };
        let key = self.resolve_key(target.into(), kind.as_str())?;
        let op = self.create_entity_operation(kind, EntityPayload::Key(key));
        self.definition.guard.must_be_key(&op)?;
        self.sink.dispatch(op)
    }

    /// Save changes from a partial entity that carries its key.
    pub fn update<T: Serialize + ?Sized>(
        &self,
        partial: &T,
        optimistic: Option<bool>,
    ) -> Result<Arc<EntityOperation>, CoreError> {
        let optimistic = optimistic.unwrap_or(self.options.optimistic_update);
        let kind = if optimistic {
            EntityOp::SaveUpdateOneOptimistic
        } else {
            EntityOp::SaveUpdateOne
        };
        let update = self.to_update(partial)?;
        let op = self.create_entity_operation(kind, EntityPayload::Update(update));
        self.definition.guard.must_be_update(&op)?;
        self.sink.dispatch(op)
    }

    /// Query every entity and replace the collection with the result.
    pub fn get_all(&self) -> Result<Arc<EntityOperation>, CoreError> {
        self.submit(EntityOp::QueryAll, EntityPayload::None)
    }

    /// Query one entity and merge it into the collection.
    pub fn get_by_key(&self, key: impl Into<EntityKey>) -> Result<Arc<EntityOperation>, CoreError> {
        self.submit(EntityOp::QueryByKey, EntityPayload::Key(key.into()))
    }

    /// Query matching entities and merge them into the collection.
    pub fn get_with_query(
        &self,
        params: impl Into<QueryParams>,
    ) -> Result<Arc<EntityOperation>, CoreError> {
        self.submit(EntityOp::QueryMany, EntityPayload::Query(params.into()))
    }

    // ── Cache-only commands ──────────────────────────────────────────

    pub fn add_all_to_cache<T: Serialize>(&self, entities: &[T]) -> Result<Arc<EntityOperation>, CoreError> {
        let entities = self.to_json_many(entities, EntityOp::AddAll.as_str())?;
        self.submit(EntityOp::AddAll, EntityPayload::Entities(entities))
    }

    pub fn add_one_to_cache<T: Serialize + ?Sized>(&self, entity: &T) -> Result<Arc<EntityOperation>, CoreError> {
        let entity = self.to_json(entity, EntityOp::AddOne.as_str())?;
        self.submit(EntityOp::AddOne, EntityPayload::Entity(entity))
    }

    pub fn add_many_to_cache<T: Serialize>(&self, entities: &[T]) -> Result<Arc<EntityOperation>, CoreError> {
        let entities = self.to_json_many(entities, EntityOp::AddMany.as_str())?;
        self.submit(EntityOp::AddMany, EntityPayload::Entities(entities))
    }

    /// Reset the collection to its initial state.
    pub fn clear_cache(&self) -> Result<Arc<EntityOperation>, CoreError> {
        self.submit(EntityOp::RemoveAll, EntityPayload::None)
    }

    pub fn remove_one_from_cache(
        &self,
        target: impl Into<EntityOrKey>,
    ) -> Result<Arc<EntityOperation>, CoreError> {
        let key = self.resolve_key(target.into(), EntityOp::RemoveOne.as_str())?;
        self.submit(EntityOp::RemoveOne, EntityPayload::Key(key))
    }

    pub fn remove_many_from_cache<K: Into<EntityKey>>(
        &self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<Arc<EntityOperation>, CoreError> {
        let keys = keys.into_iter().map(Into::into).collect();
        self.submit(EntityOp::RemoveMany, EntityPayload::Keys(keys))
    }

    pub fn update_one_in_cache<T: Serialize + ?Sized>(&self, partial: &T) -> Result<Arc<EntityOperation>, CoreError> {
        let update = self.to_update(partial)?;
        self.submit(EntityOp::UpdateOne, EntityPayload::Update(update))
    }

    pub fn update_many_in_cache<T: Serialize>(&self, partials: &[T]) -> Result<Arc<EntityOperation>, CoreError> {
        let updates = partials
            .iter()
            .map(|p| self.to_update(p))
            .collect::<Result<Vec<_>, _>>()?;
        self.submit(EntityOp::UpdateMany, EntityPayload::Updates(updates))
    }

    pub fn upsert_one_in_cache<T: Serialize + ?Sized>(&self, entity: &T) -> Result<Arc<EntityOperation>, CoreError> {
        let entity = self.to_json(entity, EntityOp::UpsertOne.as_str())?;
        self.submit(EntityOp::UpsertOne, EntityPayload::Entity(entity))
    }

    pub fn upsert_many_in_cache<T: Serialize>(&self, entities: &[T]) -> Result<Arc<EntityOperation>, CoreError> {
        let entities = self.to_json_many(entities, EntityOp::UpsertMany.as_str())?;
        self.submit(EntityOp::UpsertMany, EntityPayload::Entities(entities))
    }

    pub fn set_filter(&self, pattern: impl Into<String>) -> Result<Arc<EntityOperation>, CoreError> {
        self.submit(EntityOp::SetFilter, EntityPayload::Filter(pattern.into()))
    }

    pub fn set_loaded(&self, loaded: bool) -> Result<Arc<EntityOperation>, CoreError> {
        self.submit(EntityOp::SetLoaded, EntityPayload::Flag(loaded))
    }

    pub fn set_loading(&self, loading: bool) -> Result<Arc<EntityOperation>, CoreError> {
        self.submit(EntityOp::SetLoading, EntityPayload::Flag(loading))
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn submit(&self, op: EntityOp, payload: EntityPayload) -> Result<Arc<EntityOperation>, CoreError> {
        self.sink.dispatch(self.create_entity_operation(op, payload))
    }

    fn resolve_key(&self, target: EntityOrKey, op: &str) -> Result<EntityKey, CoreError> {
        match target {
            EntityOrKey::Key(key) => Ok(key),
            EntityOrKey::Entity(entity) => self
                .definition
                .select_id(&entity)
                .ok_or_else(|| self.invalid(op, "entity has no key")),
        }
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T, op: &str) -> Result<Value, CoreError> {
        serde_json::to_value(value)
            .map_err(|e| self.invalid(op, format!("entity does not serialize to JSON: {e}")))
    }

    fn to_json_many<T: Serialize>(&self, values: &[T], op: &str) -> Result<Vec<Value>, CoreError> {
        values.iter().map(|v| self.to_json(v, op)).collect()
    }

    fn invalid(&self, op: &str, message: impl Into<String>) -> CoreError {
        CoreError::Validation {
            entity_name: self.entity_name().to_owned(),
            op: op.to_owned(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::definition::{EntityMetadata, is_temp_key};
    use crate::model::select_id_by_field;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        ops: Mutex<Vec<Arc<EntityOperation>>>,
    }

    impl OperationSink for RecordingSink {
        fn dispatch(&self, op: EntityOperation) -> Result<Arc<EntityOperation>, CoreError> {
            let op = Arc::new(op);
            self.ops.lock().unwrap().push(Arc::clone(&op));
            Ok(op)
        }
    }

    fn dispatcher_with(metadata: EntityMetadata) -> (EntityDispatcher, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = EntityDispatcher::new(
            Arc::new(EntityDefinition::from_metadata(metadata)),
            DispatcherOptions::default(),
            sink.clone(),
        );
        (dispatcher, sink)
    }

    fn dispatcher() -> (EntityDispatcher, Arc<RecordingSink>) {
        dispatcher_with(EntityMetadata::new("Hero"))
    }

    #[derive(Serialize)]
    struct Hero {
        id: i64,
        name: String,
    }

    #[test]
    fn add_defaults_to_pessimistic() {
        let (d, sink) = dispatcher();
        let op = d.add(&json!({ "name": "A" }), None).unwrap();
        assert_eq!(op.op(), &EntityOp::SaveAddOne);
        assert_eq!(op.payload(), &EntityPayload::Entity(json!({ "name": "A" })));
        assert_eq!(sink.ops.lock().unwrap().len(), 1);
    }

    #[test]
    fn optimistic_add_stamps_tentative_key() {
        let (d, _) = dispatcher();
        let op = d.add(&json!({ "name": "A" }), Some(true)).unwrap();
        assert_eq!(op.op(), &EntityOp::SaveAddOneOptimistic);
        let EntityPayload::Entity(entity) = op.payload() else {
            panic!("expected entity payload");
        };
        assert!(EntityKey::from_value(&entity["id"]).is_some_and(|k| is_temp_key(&k)));
    }

    #[test]
    fn optimistic_add_without_stampable_key_fails_before_submission() {
        let (d, sink) =
            dispatcher_with(EntityMetadata::new("Hero").with_select_id(select_id_by_field("code")));
        let err = d.add(&json!({ "name": "A" }), Some(true)).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert!(sink.ops.lock().unwrap().is_empty());
    }

    #[test]
    fn typed_entities_serialize() {
        let (d, _) = dispatcher();
        let op = d
            .add(&Hero { id: 1, name: "A".into() }, Some(true))
            .unwrap();
        assert_eq!(op.payload(), &EntityPayload::Entity(json!({ "id": 1, "name": "A" })));
    }

    #[test]
    fn delete_defaults_to_optimistic_and_resolves_entity_key() {
        let (d, _) = dispatcher();
        let op = d.delete(json!({ "id": 3, "name": "C" }), None).unwrap();
        assert_eq!(op.op(), &EntityOp::SaveDeleteOneOptimistic);
        assert_eq!(op.payload(), &EntityPayload::Key(EntityKey::Num(3)));

        let op = d.delete(3, Some(false)).unwrap();
        assert_eq!(op.op(), &EntityOp::SaveDeleteOne);
    }

    #[test]
    fn delete_of_keyless_entity_fails() {
        let (d, sink) = dispatcher();
        assert!(d.delete(json!({ "name": "C" }), None).is_err());
        assert!(sink.ops.lock().unwrap().is_empty());
    }

    #[test]
    fn update_builds_keyed_update() {
        let (d, _) = dispatcher();
        let op = d.update(&json!({ "id": 1, "name": "B" }), None).unwrap();
        assert_eq!(op.op(), &EntityOp::SaveUpdateOneOptimistic);
        assert_eq!(
            op.payload(),
            &EntityPayload::Update(Update::new(1, json!({ "id": 1, "name": "B" })))
        );
    }

    #[test]
    fn update_without_key_fails() {
        let (d, _) = dispatcher();
        let err = d.update(&json!({ "name": "B" }), Some(false)).unwrap_err();
        assert!(err.to_string().contains("partial entity has no key"));
    }

    #[test]
    fn queries_carry_their_parameters() {
        let (d, _) = dispatcher();
        assert_eq!(d.get_all().unwrap().op(), &EntityOp::QueryAll);
        assert_eq!(
            d.get_by_key(7).unwrap().payload(),
            &EntityPayload::Key(EntityKey::Num(7))
        );
        let op = d.get_with_query("name=A").unwrap();
        assert_eq!(op.op(), &EntityOp::QueryMany);
        assert_eq!(op.payload(), &EntityPayload::Query(QueryParams::Raw("name=A".into())));
    }

    #[test]
    fn set_loading_dispatches_set_loading() {
        let (d, _) = dispatcher();
        let op = d.set_loading(true).unwrap();
        assert_eq!(op.op(), &EntityOp::SetLoading);
        assert_eq!(op.payload(), &EntityPayload::Flag(true));
        assert_eq!(d.set_loaded(false).unwrap().op(), &EntityOp::SetLoaded);
    }

    #[test]
    fn cache_commands_submit_one_operation_each() {
        let (d, sink) = dispatcher();
        d.add_all_to_cache(&[json!({ "id": 1 })]).unwrap();
        d.add_one_to_cache(&json!({ "id": 2 })).unwrap();
        d.add_many_to_cache(&[json!({ "id": 3 })]).unwrap();
        d.update_one_in_cache(&json!({ "id": 1, "name": "A" })).unwrap();
        d.update_many_in_cache(&[json!({ "id": 2, "name": "B" })]).unwrap();
        d.upsert_one_in_cache(&json!({ "id": 4 })).unwrap();
        d.upsert_many_in_cache(&[json!({ "id": 5 })]).unwrap();
        d.remove_one_from_cache(1).unwrap();
        d.remove_many_from_cache([2, 3]).unwrap();
        d.set_filter("a").unwrap();
        d.clear_cache().unwrap();

        let kinds: Vec<EntityOp> = sink.ops.lock().unwrap().iter().map(|o| o.op().clone()).collect();
        assert_eq!(
            kinds,
            vec![
                EntityOp::AddAll,
                EntityOp::AddOne,
                EntityOp::AddMany,
                EntityOp::UpdateOne,
                EntityOp::UpdateMany,
                EntityOp::UpsertOne,
                EntityOp::UpsertMany,
                EntityOp::RemoveOne,
                EntityOp::RemoveMany,
                EntityOp::SetFilter,
                EntityOp::RemoveAll,
            ]
        );
    }
}
