// ── Entity collection ──
//
// Normalized state of one entity type: ordered keys, a key → entity map,
// the filter pattern, load flags and the stash of pre-mutation values
// for unconfirmed optimistic saves. Pure data; the reducer and adapter
// own every transition.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::EntityKey;

/// Normalized, immutable-by-convention state of one entity type.
///
/// Collections are shared as `Arc<EntityCollection>`; a reduction that
/// changes nothing hands back the same `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityCollection {
    pub entity_name: String,
    /// Display order: sorted when a comparer is configured, insertion
    /// order otherwise.
    pub ids: Vec<EntityKey>,
    pub entities: HashMap<EntityKey, Arc<Value>>,
    pub filter: String,
    /// An entity-set query is in flight.
    pub loading: bool,
    /// A full-collection query has succeeded at least once.
    pub loaded: bool,
    /// Pre-mutation snapshots for keys with an unconfirmed optimistic
    /// update or delete.
    pub original_values: HashMap<EntityKey, Arc<Value>>,
    /// Keys inserted by an unconfirmed optimistic add. Only these are
    /// removed when the add fails.
    pub pending_adds: HashSet<EntityKey>,
    /// Caller-defined fields, set at creation and untouched afterwards.
    pub additional: Map<String, Value>,
}

impl EntityCollection {
    /// Empty state for `entity_name`.
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ids: Vec::new(),
            entities: HashMap::new(),
            filter: String::new(),
            loading: false,
            loaded: false,
            original_values: HashMap::new(),
            pending_adds: HashSet::new(),
            additional: Map::new(),
        }
    }

    /// Merge caller-defined fields into the state.
    pub fn with_additional(mut self, additional: Map<String, Value>) -> Self {
        self.additional.extend(additional);
        self
    }

    pub fn get(&self, key: &EntityKey) -> Option<&Arc<Value>> {
        self.entities.get(key)
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Entities in `ids` order.
    pub fn entities_in_order(&self) -> Vec<Arc<Value>> {
        self.ids
            .iter()
            .filter_map(|k| self.entities.get(k).cloned())
            .collect()
    }
}
