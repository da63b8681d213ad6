// ── Entity adapter ──
//
// Mutations of a collection's `ids`/`entities` pair. Every method works on
// a scratch copy and reports whether anything changed, so the reducer can
// hand back the original `Arc` when nothing did.

use std::sync::Arc;

use serde_json::Value;

use super::collection::EntityCollection;
use crate::model::{EntityKey, IdSelector, SortComparer, Update, merge};

/// Key-aware, order-aware mutations over an [`EntityCollection`].
#[derive(Clone)]
pub struct EntityAdapter {
    select_id: IdSelector,
    sort_comparer: Option<SortComparer>,
}

impl std::fmt::Debug for EntityAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityAdapter")
            .field("sorted", &self.sort_comparer.is_some())
            .finish_non_exhaustive()
    }
}

impl EntityAdapter {
    pub fn new(select_id: IdSelector, sort_comparer: Option<SortComparer>) -> Self {
        Self {
            select_id,
            sort_comparer,
        }
    }

    pub fn select_id(&self, entity: &Value) -> Option<EntityKey> {
        (self.select_id)(entity)
    }

    // ── Add ──────────────────────────────────────────────────────────

    /// Replace the whole entity set. Later duplicates of a key win.
    pub fn add_all(&self, col: &mut EntityCollection, entities: &[Value]) -> bool {
        col.ids.clear();
        col.entities.clear();
        for entity in entities {
            let Some(key) = self.select_id(entity) else {
                continue;
            };
            if col
                .entities
                .insert(key.clone(), Arc::new(entity.clone()))
                .is_none()
            {
                col.ids.push(key);
            }
        }
        self.sort(col);
        true
    }

    /// Insert if the key is absent. Existing entities are never replaced.
    pub fn add_one(&self, col: &mut EntityCollection, entity: &Value) -> bool {
        let changed = self.insert_absent(col, entity);
        if changed {
            self.sort(col);
        }
        changed
    }

    pub fn add_many(&self, col: &mut EntityCollection, entities: &[Value]) -> bool {
        let mut changed = false;
        for entity in entities {
            changed |= self.insert_absent(col, entity);
        }
        if changed {
            self.sort(col);
        }
        changed
    }

    /// Add, or replace the stored entity outright.
    pub fn set_one(&self, col: &mut EntityCollection, entity: &Value) -> bool {
        let Some(key) = self.select_id(entity) else {
            return false;
        };
        if col.get(&key).is_some_and(|stored| **stored == *entity) {
            return false;
        }
        if col
            .entities
            .insert(key.clone(), Arc::new(entity.clone()))
            .is_none()
        {
            col.ids.push(key);
        }
        self.sort(col);
        true
    }

    // ── Update ───────────────────────────────────────────────────────

    /// Patch an existing entity. Absent keys are ignored. If the patch
    /// changes the entity's key, the entity moves to the new key in place.
    pub fn update_one(&self, col: &mut EntityCollection, update: &Update) -> bool {
        let changed = self.patch(col, update);
        if changed {
            self.sort(col);
        }
        changed
    }

    pub fn update_many(&self, col: &mut EntityCollection, updates: &[Update]) -> bool {
        let mut changed = false;
        for update in updates {
            changed |= self.patch(col, update);
        }
        if changed {
            self.sort(col);
        }
        changed
    }

    /// Merge over an existing entity, or add it when absent.
    pub fn upsert_one(&self, col: &mut EntityCollection, entity: &Value) -> bool {
        self.upsert_many(col, std::slice::from_ref(entity))
    }

    pub fn upsert_many(&self, col: &mut EntityCollection, entities: &[Value]) -> bool {
        let mut changed = false;
        for entity in entities {
            let Some(key) = self.select_id(entity) else {
                continue;
            };
            changed |= if col.contains(&key) {
                self.patch(col, &Update::new(key, entity.clone()))
            } else {
                self.insert_absent(col, entity)
            };
        }
        if changed {
            self.sort(col);
        }
        changed
    }

    // ── Remove ───────────────────────────────────────────────────────

    pub fn remove_one(&self, col: &mut EntityCollection, key: &EntityKey) -> bool {
        self.remove_many(col, std::slice::from_ref(key))
    }

    /// Remove by key. Absent keys are ignored.
    pub fn remove_many(&self, col: &mut EntityCollection, keys: &[EntityKey]) -> bool {
        let before = col.entities.len();
        for key in keys {
            col.entities.remove(key);
        }
        if col.entities.len() == before {
            return false;
        }
        col.ids.retain(|k| col.entities.contains_key(k));
        true
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn insert_absent(&self, col: &mut EntityCollection, entity: &Value) -> bool {
        let Some(key) = self.select_id(entity) else {
            return false;
        };
        if col.contains(&key) {
            return false;
        }
        col.entities.insert(key.clone(), Arc::new(entity.clone()));
        col.ids.push(key);
        true
    }

    fn patch(&self, col: &mut EntityCollection, update: &Update) -> bool {
        let Some(stored) = col.entities.get(&update.id) else {
            return false;
        };
        let merged = merge(stored, &update.changes);
        if merged == **stored {
            return false;
        }

        let new_key = self.select_id(&merged).unwrap_or_else(|| update.id.clone());
        if new_key != update.id {
            col.entities.remove(&update.id);
            if col.contains(&new_key) {
                col.ids.retain(|k| *k != update.id);
            } else if let Some(slot) = col.ids.iter_mut().find(|k| **k == update.id) {
                *slot = new_key.clone();
            }
        }
        col.entities.insert(new_key, Arc::new(merged));
        true
    }

    /// Stable re-sort of `ids` by the comparer, if any.
    fn sort(&self, col: &mut EntityCollection) {
        let Some(cmp) = &self.sort_comparer else {
            return;
        };
        let entities = &col.entities;
        col.ids.sort_by(|a, b| match (entities.get(a), entities.get(b)) {
            (Some(a), Some(b)) => cmp(a, b),
            _ => std::cmp::Ordering::Equal,
        });
    }
}
