// ── Operations ──
//
// Operations are the sole unit of mutation. Each one names an entity
// type, a kind, and a payload whose shape the kind determines.

pub mod guard;
pub mod op;
pub mod stream;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::data_service::DataServiceError;
use crate::model::{EntityKey, Update};

pub use guard::EntityActionGuard;
pub use op::EntityOp;
pub use stream::EntityActions;

// ── QueryParams ──────────────────────────────────────────────────────

/// Parameters for a filtered multi-entity query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParams {
    /// Structured parameters; a name may repeat with several values.
    Map(BTreeMap<String, Vec<String>>),
    /// A pre-formatted query string (`name=a&power=flight`).
    Raw(String),
}

impl QueryParams {
    /// Structured params from `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (k, v) in pairs {
            map.entry(k.into()).or_default().push(v.into());
        }
        Self::Map(map)
    }

    /// Flatten structured params into `(name, value)` pairs. `None` for raw.
    pub fn to_pairs(&self) -> Option<Vec<(String, String)>> {
        match self {
            Self::Map(map) => Some(
                map.iter()
                    .flat_map(|(k, values)| values.iter().map(move |v| (k.clone(), v.clone())))
                    .collect(),
            ),
            Self::Raw(_) => None,
        }
    }
}

impl From<&str> for QueryParams {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_owned())
    }
}

// ── Payload ──────────────────────────────────────────────────────────

/// Payload of an operation. The kind decides which variant is expected;
/// the guard checks it before key-bearing operations are admitted.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityPayload {
    None,
    Entity(Value),
    Entities(Vec<Value>),
    Key(EntityKey),
    Keys(Vec<EntityKey>),
    Update(Update),
    Updates(Vec<Update>),
    Query(QueryParams),
    Filter(String),
    Flag(bool),
    Error(EntityActionError),
    /// Free-form payload for caller-defined kinds.
    Custom(Value),
}

impl EntityPayload {
    /// Short name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Entity(_) => "entity",
            Self::Entities(_) => "entities",
            Self::Key(_) => "key",
            Self::Keys(_) => "keys",
            Self::Update(_) => "update",
            Self::Updates(_) => "updates",
            Self::Query(_) => "query",
            Self::Filter(_) => "filter",
            Self::Flag(_) => "flag",
            Self::Error(_) => "error",
            Self::Custom(_) => "custom",
        }
    }
}

/// ERROR payload: the START operation that failed and why.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityActionError {
    pub original: Arc<EntityOperation>,
    pub error: DataServiceError,
}

// ── EntityOperation ──────────────────────────────────────────────────

/// An immutable instruction for one entity collection.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityOperation {
    entity_name: String,
    op: EntityOp,
    payload: EntityPayload,
    /// For completions: the START operation this one completes.
    origin: Option<Arc<EntityOperation>>,
}

impl EntityOperation {
    /// Create an operation. The entity name is trimmed.
    pub fn new(entity_name: impl AsRef<str>, op: EntityOp, payload: EntityPayload) -> Self {
        Self {
            entity_name: entity_name.as_ref().trim().to_owned(),
            op,
            payload,
            origin: None,
        }
    }

    /// Create an operation without a payload.
    pub fn bare(entity_name: impl AsRef<str>, op: EntityOp) -> Self {
        Self::new(entity_name, op, EntityPayload::None)
    }

    /// SUCCESS completion of `start` carrying `payload`.
    ///
    /// Returns `None` if `start` is not a persistence START kind.
    pub fn success_of(start: &Arc<Self>, payload: EntityPayload) -> Option<Self> {
        let op = start.op.success()?;
        Some(Self {
            entity_name: start.entity_name.clone(),
            op,
            payload,
            origin: Some(Arc::clone(start)),
        })
    }

    /// ERROR completion of `start` carrying the data-service failure.
    ///
    /// Returns `None` if `start` is not a persistence START kind.
    pub fn error_of(start: &Arc<Self>, error: DataServiceError) -> Option<Self> {
        let op = start.op.error()?;
        Some(Self {
            entity_name: start.entity_name.clone(),
            op,
            payload: EntityPayload::Error(EntityActionError {
                original: Arc::clone(start),
                error,
            }),
            origin: Some(Arc::clone(start)),
        })
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn op(&self) -> &EntityOp {
        &self.op
    }

    pub fn payload(&self) -> &EntityPayload {
        &self.payload
    }

    pub fn origin(&self) -> Option<&Arc<EntityOperation>> {
        self.origin.as_ref()
    }

    /// The data-service failure carried by an ERROR completion.
    pub fn data_service_error(&self) -> Option<&DataServiceError> {
        match &self.payload {
            EntityPayload::Error(e) => Some(&e.error),
            _ => None,
        }
    }

    /// `true` if this operation completes `start` (same allocation).
    pub fn completes(&self, start: &Arc<EntityOperation>) -> bool {
        self.origin.as_ref().is_some_and(|o| Arc::ptr_eq(o, start))
    }

    /// Action type label, e.g. `QUERY_ALL [HERO]`.
    pub fn type_label(&self) -> String {
        format!("{} [{}]", self.op, self.entity_name).to_uppercase()
    }
}
