// ── Partial updates ──
//
// An Update pairs a key with a partial entity. Changes are merged
// shallowly over the stored entity: top-level fields in `changes`
// replace their counterparts, absent fields are kept.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::key::{EntityKey, IdSelector};

/// A keyed partial entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub id: EntityKey,
    pub changes: Value,
}

impl Update {
    pub fn new(id: impl Into<EntityKey>, changes: Value) -> Self {
        Self {
            id: id.into(),
            changes,
        }
    }

    /// Build an update from a partial entity, reading its key with `select_id`.
    /// Returns `None` when the partial carries no key.
    pub fn from_partial(partial: Value, select_id: &IdSelector) -> Option<Self> {
        let id = select_id(&partial)?;
        Some(Self {
            id,
            changes: partial,
        })
    }

    /// The entity that results from applying these changes to `entity`.
    pub fn apply_to(&self, entity: &Value) -> Value {
        merge(entity, &self.changes)
    }
}

/// Shallow-merge `changes` over `base`. Non-object changes replace the
/// base outright.
pub fn merge(base: &Value, changes: &Value) -> Value {
    match (base, changes) {
        (Value::Object(base), Value::Object(changes)) => {
            let mut merged = base.clone();
            for (field, value) in changes {
                merged.insert(field.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => changes.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::key::default_select_id;
    use serde_json::json;

    #[test]
    fn apply_patches_only_given_fields() {
        let update = Update::new(1, json!({ "name": "B" }));
        let patched = update.apply_to(&json!({ "id": 1, "name": "A", "power": "x" }));
        assert_eq!(patched, json!({ "id": 1, "name": "B", "power": "x" }));
    }

    #[test]
    fn from_partial_requires_key() {
        let select = default_select_id();
        assert!(Update::from_partial(json!({ "name": "A" }), &select).is_none());

        let update = Update::from_partial(json!({ "id": 3, "name": "A" }), &select).unwrap();
        assert_eq!(update.id, EntityKey::Num(3));
        assert_eq!(update.changes, json!({ "id": 3, "name": "A" }));
    }

    #[test]
    fn non_object_changes_replace() {
        assert_eq!(merge(&json!({ "a": 1 }), &json!("x")), json!("x"));
    }
}
