// ── Payload guard ──
//
// Validates operation payloads before they can touch the cache.
// Every check fails with `CoreError::Validation`; nothing is mutated.

use serde_json::Value;

use super::{EntityOperation, EntityPayload};
use crate::error::CoreError;
use crate::model::{IdSelector, Update};

/// Validates the payload shape of key-bearing operations.
#[derive(Clone)]
pub struct EntityActionGuard {
    select_id: IdSelector,
}

impl std::fmt::Debug for EntityActionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityActionGuard").finish_non_exhaustive()
    }
}

impl EntityActionGuard {
    pub fn new(select_id: IdSelector) -> Self {
        Self { select_id }
    }

    /// Payload must be an entity with an extractable key.
    pub fn must_be_entity(&self, op: &EntityOperation) -> Result<(), CoreError> {
        match op.payload() {
            EntityPayload::Entity(entity) => self.check_entity(op, entity),
            other => Err(wrong_shape(op, "an entity", other)),
        }
    }

    /// Payload must be a list of entities, each with an extractable key.
    pub fn must_be_entities(&self, op: &EntityOperation) -> Result<(), CoreError> {
        match op.payload() {
            EntityPayload::Entities(entities) => entities
                .iter()
                .enumerate()
                .try_for_each(|(i, entity)| {
                    if (self.select_id)(entity).is_some() {
                        Ok(())
                    } else {
                        Err(invalid(op, format!("entity at index {i} has no key")))
                    }
                }),
            other => Err(wrong_shape(op, "a list of entities", other)),
        }
    }

    /// Payload must be a key.
    pub fn must_be_key(&self, op: &EntityOperation) -> Result<(), CoreError> {
        match op.payload() {
            EntityPayload::Key(_) => Ok(()),
            other => Err(wrong_shape(op, "a key", other)),
        }
    }

    /// Payload must be a list of keys.
    pub fn must_be_keys(&self, op: &EntityOperation) -> Result<(), CoreError> {
        match op.payload() {
            EntityPayload::Keys(_) => Ok(()),
            other => Err(wrong_shape(op, "a list of keys", other)),
        }
    }

    /// Payload must be an update whose changes are an object. If the
    /// changes carry a key of their own it must agree with the update key.
    pub fn must_be_update(&self, op: &EntityOperation) -> Result<(), CoreError> {
        match op.payload() {
            EntityPayload::Update(update) => self.check_update(op, update),
            other => Err(wrong_shape(op, "an update", other)),
        }
    }

    /// Payload must be a list of well-formed updates.
    pub fn must_be_updates(&self, op: &EntityOperation) -> Result<(), CoreError> {
        match op.payload() {
            EntityPayload::Updates(updates) => {
                updates.iter().try_for_each(|u| self.check_update(op, u))
            }
            other => Err(wrong_shape(op, "a list of updates", other)),
        }
    }

    fn check_entity(&self, op: &EntityOperation, entity: &Value) -> Result<(), CoreError> {
        if !entity.is_object() {
            return Err(invalid(op, "entity must be a JSON object"));
        }
        if (self.select_id)(entity).is_none() {
            return Err(invalid(op, "entity has no key"));
        }
        Ok(())
    }

    fn check_update(&self, op: &EntityOperation, update: &Update) -> Result<(), CoreError> {
        if !update.changes.is_object() {
            return Err(invalid(op, "update changes must be a JSON object"));
        }
        match (self.select_id)(&update.changes) {
            Some(key) if key != update.id => Err(invalid(
                op,
                format!("update key {} disagrees with changes key {key}", update.id),
            )),
            _ => Ok(()),
        }
    }
}

fn invalid(op: &EntityOperation, message: impl Into<String>) -> CoreError {
    CoreError::Validation {
        entity_name: op.entity_name().to_owned(),
        op: op.op().to_string(),
        message: message.into(),
    }
}

fn wrong_shape(op: &EntityOperation, expected: &str, got: &EntityPayload) -> CoreError {
    invalid(
        op,
        format!("payload must be {expected}, got {}", got.kind_name()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::EntityOp;
    use crate::model::{EntityKey, default_select_id};
    use serde_json::json;

    fn guard() -> EntityActionGuard {
        EntityActionGuard::new(default_select_id())
    }

    fn op(payload: EntityPayload) -> EntityOperation {
        EntityOperation::new("Hero", EntityOp::SaveAddOneOptimistic, payload)
    }

    #[test]
    fn entity_with_key_passes() {
        let op = op(EntityPayload::Entity(json!({ "id": 1, "name": "A" })));
        assert!(guard().must_be_entity(&op).is_ok());
    }

    #[test]
    fn entity_without_key_fails() {
        let op = op(EntityPayload::Entity(json!({ "name": "A" })));
        let err = guard().must_be_entity(&op);
        assert!(matches!(err, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn non_entity_payload_fails() {
        let op = op(EntityPayload::Key(EntityKey::Num(1)));
        let err = guard().must_be_entity(&op).err().map(|e| e.to_string());
        assert!(err.is_some_and(|m| m.contains("payload must be an entity, got key")));
    }

    #[test]
    fn entities_report_offending_index() {
        let op = op(EntityPayload::Entities(vec![json!({ "id": 1 }), json!({})]));
        let err = guard().must_be_entities(&op).err().map(|e| e.to_string());
        assert!(err.is_some_and(|m| m.contains("index 1")));
    }

    #[test]
    fn key_and_keys() {
        assert!(guard().must_be_key(&op(EntityPayload::Key(EntityKey::Num(1)))).is_ok());
        assert!(guard().must_be_key(&op(EntityPayload::None)).is_err());
        assert!(guard().must_be_keys(&op(EntityPayload::Keys(vec![]))).is_ok());
    }

    #[test]
    fn update_with_conflicting_key_fails() {
        let update = Update::new(1, json!({ "id": 2, "name": "B" }));
        assert!(guard().must_be_update(&op(EntityPayload::Update(update))).is_err());
    }

    #[test]
    fn update_without_key_in_changes_passes() {
        let update = Update::new(1, json!({ "name": "B" }));
        assert!(guard().must_be_update(&op(EntityPayload::Update(update))).is_ok());
    }

    #[test]
    fn update_with_non_object_changes_fails() {
        let update = Update::new(1, json!("B"));
        assert!(guard().must_be_updates(&op(EntityPayload::Updates(vec![update]))).is_err());
    }
}
