// ── Collection reducer ──
//
// (collection, operation) → collection. Cache-only kinds mutate through
// the adapter; persistence kinds walk START → SUCCESS | ERROR, stashing
// pre-mutation values for optimistic saves and restoring them on ERROR.
// A reduction that changes nothing returns the input `Arc`.

use std::sync::Arc;

use serde_json::Value;
use tracing::{trace, warn};

use crate::action::{EntityOp, EntityOperation, EntityPayload};
use crate::definition::EntityDefinition;
use crate::error::CoreError;
use crate::model::EntityKey;
use crate::store::EntityCollection;

/// Outcome of reducing one operation into one collection.
pub type ReduceResult = Result<Arc<EntityCollection>, CoreError>;

/// Reduces operations into a collection.
///
/// Implemented by [`DefaultCollectionReducer`] and by any
/// `Fn(Arc<EntityCollection>, &EntityOperation) -> ReduceResult`.
pub trait EntityCollectionReducer: Send + Sync {
    fn reduce(&self, collection: Arc<EntityCollection>, op: &EntityOperation) -> ReduceResult;
}

impl<F> EntityCollectionReducer for F
where
    F: Fn(Arc<EntityCollection>, &EntityOperation) -> ReduceResult + Send + Sync,
{
    fn reduce(&self, collection: Arc<EntityCollection>, op: &EntityOperation) -> ReduceResult {
        self(collection, op)
    }
}

/// The standard reducer for one entity type.
#[derive(Debug, Clone)]
pub struct DefaultCollectionReducer {
    definition: Arc<EntityDefinition>,
}

impl DefaultCollectionReducer {
    pub fn new(definition: Arc<EntityDefinition>) -> Self {
        Self { definition }
    }

    /// Reject malformed optimistic STARTs before they touch state.
    fn guard(&self, op: &EntityOperation) -> Result<(), CoreError> {
        let guard = &self.definition.guard;
        match op.op() {
            EntityOp::SaveAddOneOptimistic => guard.must_be_entity(op),
            EntityOp::SaveDeleteOneOptimistic => guard.must_be_key(op),
            EntityOp::SaveUpdateOneOptimistic => guard.must_be_update(op),
            _ => Ok(()),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn apply(&self, col: &mut EntityCollection, op: &EntityOperation) -> bool {
        let adapter = &self.definition.adapter;
        let payload = op.payload();

        match op.op() {
            // ── Query all ────────────────────────────────────────────
            EntityOp::QueryAll | EntityOp::QueryMany => set_flag(&mut col.loading, true),
            EntityOp::QueryAllSuccess => match payload {
                EntityPayload::Entities(entities) => {
                    adapter.add_all(col, entities);
                    col.original_values.clear();
                    col.pending_adds.clear();
                    col.loading = false;
                    col.loaded = true;
                    true
                }
                other => ignored(op, other),
            },
            EntityOp::QueryAllError | EntityOp::QueryManyError => set_flag(&mut col.loading, false),

            // ── Query many ───────────────────────────────────────────
            EntityOp::QueryManySuccess => match payload {
                EntityPayload::Entities(entities) => {
                    let merged = adapter.upsert_many(col, entities);
                    set_flag(&mut col.loading, false) | merged
                }
                other => ignored(op, other),
            },

            // ── Query by key ─────────────────────────────────────────
            EntityOp::QueryByKey | EntityOp::QueryByKeyError => false,
            EntityOp::QueryByKeySuccess => match payload {
                EntityPayload::Entity(entity) if !entity.is_null() => adapter.upsert_one(col, entity),
                _ => false,
            },

            // ── Save add ─────────────────────────────────────────────
            EntityOp::SaveAddOne => false,
            EntityOp::SaveAddOneOptimistic => match payload {
                EntityPayload::Entity(entity) => {
                    // A key that is already cached stays untouched and is
                    // not ours to roll back.
                    let Some(key) = adapter.select_id(entity) else {
                        return false;
                    };
                    if !adapter.add_one(col, entity) {
                        return false;
                    }
                    col.pending_adds.insert(key);
                    true
                }
                other => ignored(op, other),
            },
            EntityOp::SaveAddOneSuccess => match payload {
                EntityPayload::Entity(saved) => self.confirm_add(col, op, saved),
                other => ignored(op, other),
            },
            EntityOp::SaveAddOneError => match optimistic_origin(op).map(EntityOperation::payload) {
                Some(EntityPayload::Entity(tentative)) => {
                    let Some(key) = adapter.select_id(tentative) else {
                        return false;
                    };
                    if !col.pending_adds.remove(&key) {
                        return false;
                    }
                    warn!(entity = op.entity_name(), %key, "rolling back optimistic add");
                    adapter.remove_one(col, &key);
                    true
                }
                _ => false,
            },

            // ── Save delete ──────────────────────────────────────────
            EntityOp::SaveDeleteOne => false,
            EntityOp::SaveDeleteOneOptimistic => match payload {
                EntityPayload::Key(key) => {
                    let Some(stored) = col.get(key).cloned() else {
                        return false;
                    };
                    col.original_values.entry(key.clone()).or_insert(stored);
                    adapter.remove_one(col, key)
                }
                other => ignored(op, other),
            },
            EntityOp::SaveDeleteOneSuccess => match payload {
                EntityPayload::Key(key) => {
                    let removed = adapter.remove_one(col, key);
                    col.original_values.remove(key).is_some() | removed
                }
                other => ignored(op, other),
            },
            EntityOp::SaveDeleteOneError => match optimistic_origin(op).map(EntityOperation::payload) {
                Some(EntityPayload::Key(key)) => {
                    let Some(original) = col.original_values.remove(key) else {
                        return false;
                    };
                    warn!(entity = op.entity_name(), %key, "rolling back optimistic delete");
                    adapter.add_one(col, &original);
                    true
                }
                _ => false,
            },

            // ── Save update ──────────────────────────────────────────
            EntityOp::SaveUpdateOne => false,
            EntityOp::SaveUpdateOneOptimistic => match payload {
                EntityPayload::Update(update) => {
                    let Some(stored) = col.get(&update.id).cloned() else {
                        return false;
                    };
                    if !adapter.update_one(col, update) {
                        return false;
                    }
                    // An earlier unconfirmed update keeps the oldest snapshot.
                    col.original_values.entry(update.id.clone()).or_insert(stored);
                    true
                }
                other => ignored(op, other),
            },
            EntityOp::SaveUpdateOneSuccess => match payload {
                EntityPayload::Update(update) => {
                    let patched = adapter.update_one(col, update);
                    col.original_values.remove(&update.id).is_some() | patched
                }
                other => ignored(op, other),
            },
            EntityOp::SaveUpdateOneError => match optimistic_origin(op).map(EntityOperation::payload) {
                Some(EntityPayload::Update(update)) => {
                    let Some(original) = col.original_values.remove(&update.id) else {
                        return false;
                    };
                    warn!(entity = op.entity_name(), key = %update.id, "rolling back optimistic update");
                    adapter.set_one(col, &original);
                    true
                }
                _ => false,
            },

            // ── Cache only ───────────────────────────────────────────
            EntityOp::AddAll => match payload {
                EntityPayload::Entities(entities) => {
                    adapter.add_all(col, entities);
                    col.original_values.clear();
                    col.pending_adds.clear();
                    true
                }
                other => ignored(op, other),
            },
            EntityOp::AddOne => match payload {
                EntityPayload::Entity(entity) => adapter.add_one(col, entity),
                other => ignored(op, other),
            },
            EntityOp::AddMany => match payload {
                EntityPayload::Entities(entities) => adapter.add_many(col, entities),
                other => ignored(op, other),
            },
            EntityOp::UpdateOne => match payload {
                EntityPayload::Update(update) => adapter.update_one(col, update),
                other => ignored(op, other),
            },
            EntityOp::UpdateMany => match payload {
                EntityPayload::Updates(updates) => adapter.update_many(col, updates),
                other => ignored(op, other),
            },
            EntityOp::UpsertOne => match payload {
                EntityPayload::Entity(entity) => adapter.upsert_one(col, entity),
                other => ignored(op, other),
            },
            EntityOp::UpsertMany => match payload {
                EntityPayload::Entities(entities) => adapter.upsert_many(col, entities),
                other => ignored(op, other),
            },
            EntityOp::RemoveOne => match payload {
                EntityPayload::Key(key) => adapter.remove_one(col, key),
                other => ignored(op, other),
            },
            EntityOp::RemoveMany => match payload {
                EntityPayload::Keys(keys) => adapter.remove_many(col, keys),
                other => ignored(op, other),
            },
            EntityOp::SetFilter => match payload {
                EntityPayload::Filter(pattern) if col.filter != *pattern => {
                    col.filter.clone_from(pattern);
                    true
                }
                EntityPayload::Filter(_) => false,
                other => ignored(op, other),
            },
            EntityOp::SetLoaded => match payload {
                EntityPayload::Flag(flag) => set_flag(&mut col.loaded, *flag),
                other => ignored(op, other),
            },
            EntityOp::SetLoading => match payload {
                EntityPayload::Flag(flag) => set_flag(&mut col.loading, *flag),
                other => ignored(op, other),
            },

            // Handled before cloning; listed for exhaustiveness.
            EntityOp::RemoveAll | EntityOp::Custom(_) => false,
        }
    }

    /// Fold the server-confirmed entity in. A tentative entity whose key
    /// the server replaced is dropped first; an entity that was already
    /// cached under the tentative key is left alone.
    fn confirm_add(&self, col: &mut EntityCollection, op: &EntityOperation, saved: &Value) -> bool {
        let adapter = &self.definition.adapter;
        let saved_key = adapter.select_id(saved);

        let mut changed = false;
        if let Some(EntityPayload::Entity(tentative)) = optimistic_origin(op).map(EntityOperation::payload) {
            let tentative_key: Option<EntityKey> = adapter.select_id(tentative);
            if let Some(key) = tentative_key.filter(|k| col.pending_adds.remove(k)) {
                changed = true;
                if Some(&key) != saved_key.as_ref() {
                    adapter.remove_one(col, &key);
                }
            }
        }
        adapter.set_one(col, saved) | changed
    }
}

impl EntityCollectionReducer for DefaultCollectionReducer {
    fn reduce(&self, collection: Arc<EntityCollection>, op: &EntityOperation) -> ReduceResult {
        match op.op() {
            EntityOp::Custom(_) => return Ok(collection),
            EntityOp::RemoveAll => {
                let initial = self.definition.initial_state();
                return Ok(if *collection == *initial { collection } else { initial });
            }
            _ => {}
        }

        self.guard(op)?;

        let mut next = EntityCollection::clone(&collection);
        if self.apply(&mut next, op) {
            trace!(entity = op.entity_name(), op = %op.op(), "collection changed");
            Ok(Arc::new(next))
        } else {
            Ok(collection)
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// The START this completion answers, if that START was optimistic.
fn optimistic_origin(op: &EntityOperation) -> Option<&EntityOperation> {
    op.origin()
        .map(|origin| &**origin)
        .filter(|origin| origin.op().is_optimistic())
}

fn set_flag(flag: &mut bool, value: bool) -> bool {
    let changed = *flag != value;
    *flag = value;
    changed
}

fn ignored(op: &EntityOperation, payload: &EntityPayload) -> bool {
    warn!(
        op = %op.type_label(),
        payload = payload.kind_name(),
        "ignoring operation with unexpected payload"
    );
    false
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::data_service::DataServiceError;
    use crate::definition::EntityMetadata;
    use crate::model::Update;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stashly_api::HttpMethod;

    fn reducer() -> DefaultCollectionReducer {
        DefaultCollectionReducer::new(Arc::new(EntityDefinition::from_metadata(
            EntityMetadata::new("Hero"),
        )))
    }

    fn empty() -> Arc<EntityCollection> {
        Arc::new(EntityCollection::new("Hero"))
    }

    fn op(kind: EntityOp, payload: EntityPayload) -> EntityOperation {
        EntityOperation::new("Hero", kind, payload)
    }

    fn seeded(r: &DefaultCollectionReducer) -> Arc<EntityCollection> {
        r.reduce(
            empty(),
            &op(
                EntityOp::AddAll,
                EntityPayload::Entities(vec![
                    json!({ "id": 1, "name": "A", "power": "x" }),
                    json!({ "id": 2, "name": "B", "power": "y" }),
                ]),
            ),
        )
        .unwrap()
    }

    fn failure() -> DataServiceError {
        DataServiceError::new(Some(500), "boom", HttpMethod::Put, "api/hero/1")
    }

    fn key(n: i64) -> EntityKey {
        EntityKey::Num(n)
    }

    #[test]
    fn add_one_never_overwrites() {
        let r = reducer();
        let col = seeded(&r);
        let next = r
            .reduce(
                Arc::clone(&col),
                &op(EntityOp::AddOne, EntityPayload::Entity(json!({ "id": 1, "name": "Z" }))),
            )
            .unwrap();
        assert!(Arc::ptr_eq(&col, &next));
        assert_eq!(next.get(&key(1)).unwrap()["name"], "A");
    }

    #[test]
    fn update_of_absent_key_is_reference_equal() {
        let r = reducer();
        let col = seeded(&r);
        let next = r
            .reduce(
                Arc::clone(&col),
                &op(EntityOp::UpdateOne, EntityPayload::Update(Update::new(9, json!({ "name": "Z" })))),
            )
            .unwrap();
        assert!(Arc::ptr_eq(&col, &next));
    }

    #[test]
    fn remove_one_twice_equals_once() {
        let r = reducer();
        let remove = op(EntityOp::RemoveOne, EntityPayload::Key(key(1)));
        let once = r.reduce(seeded(&r), &remove).unwrap();
        let twice = r.reduce(Arc::clone(&once), &remove).unwrap();
        assert_eq!(*once, *twice);
        assert!(Arc::ptr_eq(&once, &twice));
    }

    #[test]
    fn remove_all_then_add_all_keeps_given_order() {
        let r = reducer();
        let cleared = r.reduce(seeded(&r), &op(EntityOp::RemoveAll, EntityPayload::None)).unwrap();
        assert!(cleared.is_empty());

        let entities = vec![json!({ "id": 3 }), json!({ "id": 1 }), json!({ "id": 2 })];
        let next = r
            .reduce(cleared, &op(EntityOp::AddAll, EntityPayload::Entities(entities)))
            .unwrap();
        assert_eq!(next.ids, vec![key(3), key(1), key(2)]);
    }

    #[test]
    fn query_all_lifecycle() {
        let r = reducer();
        let start = Arc::new(op(EntityOp::QueryAll, EntityPayload::None));
        let loading = r.reduce(empty(), &start).unwrap();
        assert!(loading.loading);

        let done = EntityOperation::success_of(
            &start,
            EntityPayload::Entities(vec![json!({ "id": 1 })]),
        )
        .unwrap();
        let loaded = r.reduce(loading, &done).unwrap();
        assert!(!loaded.loading);
        assert!(loaded.loaded);
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn query_all_error_only_clears_loading() {
        let r = reducer();
        let start = Arc::new(op(EntityOp::QueryAll, EntityPayload::None));
        let loading = r.reduce(seeded(&r), &start).unwrap();
        let err = DataServiceError::new(Some(404), "Not Found", HttpMethod::Get, "api/heroes/");
        let failed = r
            .reduce(Arc::clone(&loading), &EntityOperation::error_of(&start, err).unwrap())
            .unwrap();
        assert!(!failed.loading);
        assert!(!failed.loaded);
        assert_eq!(failed.entities, loading.entities);
    }

    #[test]
    fn query_many_merges_instead_of_replacing() {
        let r = reducer();
        let start = Arc::new(op(EntityOp::QueryMany, EntityPayload::None));
        let loading = r.reduce(seeded(&r), &start).unwrap();
        let done = EntityOperation::success_of(
            &start,
            EntityPayload::Entities(vec![json!({ "id": 1, "name": "A2" }), json!({ "id": 3 })]),
        )
        .unwrap();
        let next = r.reduce(loading, &done).unwrap();
        assert_eq!(next.len(), 3);
        assert_eq!(next.get(&key(1)).unwrap()["power"], "x");
        assert_eq!(next.get(&key(1)).unwrap()["name"], "A2");
        assert!(!next.loading);
    }

    #[test]
    fn query_by_key_with_no_result_is_a_no_op() {
        let r = reducer();
        let col = seeded(&r);
        let start = Arc::new(op(EntityOp::QueryByKey, EntityPayload::Key(key(5))));
        let done = EntityOperation::success_of(&start, EntityPayload::None).unwrap();
        assert!(Arc::ptr_eq(&col, &r.reduce(Arc::clone(&col), &done).unwrap()));
    }

    #[test]
    fn optimistic_add_success_replaces_tentative_entity() {
        let r = reducer();
        let start = Arc::new(op(
            EntityOp::SaveAddOneOptimistic,
            EntityPayload::Entity(json!({ "id": "tmp-1", "name": "A" })),
        ));
        let tentative = r.reduce(empty(), &start).unwrap();
        assert!(tentative.contains(&EntityKey::from("tmp-1")));
        assert!(tentative.original_values.is_empty());

        let done = EntityOperation::success_of(
            &start,
            EntityPayload::Entity(json!({ "id": 42, "name": "A" })),
        )
        .unwrap();
        let confirmed = r.reduce(tentative, &done).unwrap();
        assert_eq!(confirmed.ids, vec![key(42)]);
        assert_eq!(**confirmed.get(&key(42)).unwrap(), json!({ "id": 42, "name": "A" }));
    }

    #[test]
    fn optimistic_add_error_removes_tentative_entity() {
        let r = reducer();
        let start = Arc::new(op(
            EntityOp::SaveAddOneOptimistic,
            EntityPayload::Entity(json!({ "id": 7, "name": "A" })),
        ));
        let tentative = r.reduce(empty(), &start).unwrap();
        let failed = r
            .reduce(tentative, &EntityOperation::error_of(&start, failure()).unwrap())
            .unwrap();
        assert!(failed.is_empty());
        assert!(failed.pending_adds.is_empty());
    }

    #[test]
    fn failed_optimistic_add_keeps_entity_it_did_not_insert() {
        let r = reducer();
        let col = seeded(&r);
        let start = Arc::new(op(
            EntityOp::SaveAddOneOptimistic,
            EntityPayload::Entity(json!({ "id": 1, "name": "New" })),
        ));
        let same = r.reduce(Arc::clone(&col), &start).unwrap();
        assert!(Arc::ptr_eq(&col, &same));

        let conflict = DataServiceError::new(Some(409), "Conflict", HttpMethod::Post, "api/hero/");
        let failed = r
            .reduce(Arc::clone(&same), &EntityOperation::error_of(&start, conflict).unwrap())
            .unwrap();
        assert!(Arc::ptr_eq(&col, &failed));
        assert_eq!(failed.get(&key(1)).unwrap()["name"], "A");
    }

    #[test]
    fn confirmed_add_under_new_key_keeps_existing_entity() {
        let r = reducer();
        let col = seeded(&r);
        let start = Arc::new(op(
            EntityOp::SaveAddOneOptimistic,
            EntityPayload::Entity(json!({ "id": 1, "name": "New" })),
        ));
        let same = r.reduce(Arc::clone(&col), &start).unwrap();
        let done = EntityOperation::success_of(
            &start,
            EntityPayload::Entity(json!({ "id": 3, "name": "New" })),
        )
        .unwrap();
        let confirmed = r.reduce(same, &done).unwrap();
        assert_eq!(confirmed.ids, vec![key(1), key(2), key(3)]);
        assert_eq!(confirmed.get(&key(1)).unwrap()["name"], "A");
    }

    #[test]
    fn pessimistic_add_waits_for_success() {
        let r = reducer();
        let col = empty();
        let start = Arc::new(op(EntityOp::SaveAddOne, EntityPayload::Entity(json!({ "name": "A" }))));
        assert!(Arc::ptr_eq(&col, &r.reduce(Arc::clone(&col), &start).unwrap()));

        let done =
            EntityOperation::success_of(&start, EntityPayload::Entity(json!({ "id": 1, "name": "A" })))
                .unwrap();
        assert_eq!(r.reduce(col, &done).unwrap().len(), 1);
    }

    #[test]
    fn optimistic_delete_error_restores_entity() {
        let r = reducer();
        let col = seeded(&r);
        let start = Arc::new(op(EntityOp::SaveDeleteOneOptimistic, EntityPayload::Key(key(1))));
        let removed = r.reduce(Arc::clone(&col), &start).unwrap();
        assert!(!removed.contains(&key(1)));
        assert_eq!(removed.original_values[&key(1)], col.entities[&key(1)]);

        let restored = r
            .reduce(removed, &EntityOperation::error_of(&start, failure()).unwrap())
            .unwrap();
        assert_eq!(restored.entities, col.entities);
        assert!(restored.original_values.is_empty());
    }

    #[test]
    fn delete_success_clears_stash() {
        let r = reducer();
        let start = Arc::new(op(EntityOp::SaveDeleteOneOptimistic, EntityPayload::Key(key(1))));
        let removed = r.reduce(seeded(&r), &start).unwrap();
        let done = EntityOperation::success_of(&start, EntityPayload::Key(key(1))).unwrap();
        let confirmed = r.reduce(removed, &done).unwrap();
        assert!(confirmed.original_values.is_empty());
        assert_eq!(confirmed.len(), 1);
    }

    #[test]
    fn pessimistic_delete_error_is_a_no_op() {
        let r = reducer();
        let col = seeded(&r);
        let start = Arc::new(op(EntityOp::SaveDeleteOne, EntityPayload::Key(key(1))));
        let same = r.reduce(Arc::clone(&col), &start).unwrap();
        let failed = r
            .reduce(Arc::clone(&same), &EntityOperation::error_of(&start, failure()).unwrap())
            .unwrap();
        assert!(Arc::ptr_eq(&col, &failed));
    }

    #[test]
    fn optimistic_update_error_restores_exact_original() {
        let r = reducer();
        let col = seeded(&r);
        let start = Arc::new(op(
            EntityOp::SaveUpdateOneOptimistic,
            EntityPayload::Update(Update::new(1, json!({ "name": "Z", "extra": true }))),
        ));
        let patched = r.reduce(Arc::clone(&col), &start).unwrap();
        assert_eq!(patched.get(&key(1)).unwrap()["name"], "Z");

        let restored = r
            .reduce(patched, &EntityOperation::error_of(&start, failure()).unwrap())
            .unwrap();
        assert_eq!(restored.get(&key(1)), col.get(&key(1)));
        assert!(restored.original_values.is_empty());
    }

    #[test]
    fn second_optimistic_update_keeps_oldest_snapshot() {
        let r = reducer();
        let col = seeded(&r);
        let first = Arc::new(op(
            EntityOp::SaveUpdateOneOptimistic,
            EntityPayload::Update(Update::new(1, json!({ "name": "M" }))),
        ));
        let second = Arc::new(op(
            EntityOp::SaveUpdateOneOptimistic,
            EntityPayload::Update(Update::new(1, json!({ "name": "N" }))),
        ));
        let patched = r.reduce(Arc::clone(&col), &first).unwrap();
        let patched = r.reduce(patched, &second).unwrap();
        assert_eq!(patched.original_values[&key(1)]["name"], "A");
    }

    #[test]
    fn update_success_applies_server_changes_and_clears_stash() {
        let r = reducer();
        let start = Arc::new(op(
            EntityOp::SaveUpdateOneOptimistic,
            EntityPayload::Update(Update::new(1, json!({ "name": "Z" }))),
        ));
        let patched = r.reduce(seeded(&r), &start).unwrap();
        let done = EntityOperation::success_of(
            &start,
            EntityPayload::Update(Update::new(1, json!({ "id": 1, "name": "Z!", "power": "x" }))),
        )
        .unwrap();
        let confirmed = r.reduce(patched, &done).unwrap();
        assert_eq!(confirmed.get(&key(1)).unwrap()["name"], "Z!");
        assert!(confirmed.original_values.is_empty());
    }

    #[test]
    fn malformed_optimistic_start_is_rejected() {
        let r = reducer();
        let bad = op(EntityOp::SaveAddOneOptimistic, EntityPayload::Entity(json!({ "name": "A" })));
        assert!(matches!(r.reduce(empty(), &bad), Err(CoreError::Validation { .. })));
    }

    #[test]
    fn custom_kinds_pass_through() {
        let r = reducer();
        let col = seeded(&r);
        let custom = op(EntityOp::Custom("ARCHIVE".into()), EntityPayload::Custom(json!(1)));
        assert!(Arc::ptr_eq(&col, &r.reduce(Arc::clone(&col), &custom).unwrap()));
    }

    #[test]
    fn flags_and_filter() {
        let r = reducer();
        let col = r
            .reduce(empty(), &op(EntityOp::SetFilter, EntityPayload::Filter("wind".into())))
            .unwrap();
        assert_eq!(col.filter, "wind");
        let col = r.reduce(col, &op(EntityOp::SetLoaded, EntityPayload::Flag(true))).unwrap();
        assert!(col.loaded);
        let col = r.reduce(col, &op(EntityOp::SetLoading, EntityPayload::Flag(true))).unwrap();
        assert!(col.loading);
        let same = r
            .reduce(Arc::clone(&col), &op(EntityOp::SetLoading, EntityPayload::Flag(true)))
            .unwrap();
        assert!(Arc::ptr_eq(&col, &same));
    }

    #[test]
    fn functions_are_collection_reducers() {
        fn clear_filter(col: Arc<EntityCollection>, _op: &EntityOperation) -> ReduceResult {
            let mut next = EntityCollection::clone(&col);
            next.filter.clear();
            Ok(Arc::new(next))
        }
        let custom: Box<dyn EntityCollectionReducer> = Box::new(clear_filter);
        let mut col = EntityCollection::new("Hero");
        col.filter = "x".into();
        let next = custom
            .reduce(Arc::new(col), &op(EntityOp::QueryAll, EntityPayload::None))
            .unwrap();
        assert_eq!(next.filter, "");
    }
}
