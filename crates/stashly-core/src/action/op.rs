// ── Operation kinds ──
//
// The closed set of things an operation can ask of a collection.
// Persistence kinds come in START / SUCCESS / ERROR triples; optimistic
// and pessimistic STARTs share their completion kinds.

use std::fmt;

/// Kind of an [`EntityOperation`](super::EntityOperation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityOp {
    // ── Persistence: queries ─────────────────────────────────────────
    QueryAll,
    QueryAllSuccess,
    QueryAllError,

    QueryMany,
    QueryManySuccess,
    QueryManyError,

    QueryByKey,
    QueryByKeySuccess,
    QueryByKeyError,

    // ── Persistence: saves ───────────────────────────────────────────
    SaveAddOne,
    SaveAddOneOptimistic,
    SaveAddOneSuccess,
    SaveAddOneError,

    SaveDeleteOne,
    SaveDeleteOneOptimistic,
    SaveDeleteOneSuccess,
    SaveDeleteOneError,

    SaveUpdateOne,
    SaveUpdateOneOptimistic,
    SaveUpdateOneSuccess,
    SaveUpdateOneError,

    // ── Cache only ───────────────────────────────────────────────────
    AddAll,
    AddOne,
    AddMany,
    UpdateOne,
    UpdateMany,
    UpsertOne,
    UpsertMany,
    RemoveOne,
    RemoveMany,
    RemoveAll,
    SetFilter,
    SetLoaded,
    SetLoading,

    /// A caller-defined kind. Routed like any other operation; the default
    /// reducer passes it through untouched.
    #[strum(default)]
    Custom(String),
}

impl EntityOp {
    /// Wire name (`QUERY_ALL`, `SAVE_ADD_ONE_OPTIMISTIC`, ...).
    pub fn as_str(&self) -> &str {
        match self {
            Self::QueryAll => "QUERY_ALL",
            Self::QueryAllSuccess => "QUERY_ALL_SUCCESS",
            Self::QueryAllError => "QUERY_ALL_ERROR",
            Self::QueryMany => "QUERY_MANY",
            Self::QueryManySuccess => "QUERY_MANY_SUCCESS",
            Self::QueryManyError => "QUERY_MANY_ERROR",
            Self::QueryByKey => "QUERY_BY_KEY",
            Self::QueryByKeySuccess => "QUERY_BY_KEY_SUCCESS",
            Self::QueryByKeyError => "QUERY_BY_KEY_ERROR",
            Self::SaveAddOne => "SAVE_ADD_ONE",
            Self::SaveAddOneOptimistic => "SAVE_ADD_ONE_OPTIMISTIC",
            Self::SaveAddOneSuccess => "SAVE_ADD_ONE_SUCCESS",
            Self::SaveAddOneError => "SAVE_ADD_ONE_ERROR",
            Self::SaveDeleteOne => "SAVE_DELETE_ONE",
            Self::SaveDeleteOneOptimistic => "SAVE_DELETE_ONE_OPTIMISTIC",
            Self::SaveDeleteOneSuccess => "SAVE_DELETE_ONE_SUCCESS",
            Self::SaveDeleteOneError => "SAVE_DELETE_ONE_ERROR",
            Self::SaveUpdateOne => "SAVE_UPDATE_ONE",
            Self::SaveUpdateOneOptimistic => "SAVE_UPDATE_ONE_OPTIMISTIC",
            Self::SaveUpdateOneSuccess => "SAVE_UPDATE_ONE_SUCCESS",
            Self::SaveUpdateOneError => "SAVE_UPDATE_ONE_ERROR",
            Self::AddAll => "ADD_ALL",
            Self::AddOne => "ADD_ONE",
            Self::AddMany => "ADD_MANY",
            Self::UpdateOne => "UPDATE_ONE",
            Self::UpdateMany => "UPDATE_MANY",
            Self::UpsertOne => "UPSERT_ONE",
            Self::UpsertMany => "UPSERT_MANY",
            Self::RemoveOne => "REMOVE_ONE",
            Self::RemoveMany => "REMOVE_MANY",
            Self::RemoveAll => "REMOVE_ALL",
            Self::SetFilter => "SET_FILTER",
            Self::SetLoaded => "SET_LOADED",
            Self::SetLoading => "SET_LOADING",
            Self::Custom(name) => name,
        }
    }

    /// START kinds that require a data-service call.
    pub fn is_persist(&self) -> bool {
        matches!(
            self,
            Self::QueryAll
                | Self::QueryMany
                | Self::QueryByKey
                | Self::SaveAddOne
                | Self::SaveAddOneOptimistic
                | Self::SaveDeleteOne
                | Self::SaveDeleteOneOptimistic
                | Self::SaveUpdateOne
                | Self::SaveUpdateOneOptimistic
        )
    }

    pub fn is_optimistic(&self) -> bool {
        matches!(
            self,
            Self::SaveAddOneOptimistic | Self::SaveDeleteOneOptimistic | Self::SaveUpdateOneOptimistic
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::QueryAllSuccess
                | Self::QueryManySuccess
                | Self::QueryByKeySuccess
                | Self::SaveAddOneSuccess
                | Self::SaveDeleteOneSuccess
                | Self::SaveUpdateOneSuccess
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::QueryAllError
                | Self::QueryManyError
                | Self::QueryByKeyError
                | Self::SaveAddOneError
                | Self::SaveDeleteOneError
                | Self::SaveUpdateOneError
        )
    }

    /// SUCCESS kind completing this START kind.
    pub fn success(&self) -> Option<Self> {
        match self {
            Self::QueryAll => Some(Self::QueryAllSuccess),
            Self::QueryMany => Some(Self::QueryManySuccess),
            Self::QueryByKey => Some(Self::QueryByKeySuccess),
            Self::SaveAddOne | Self::SaveAddOneOptimistic => Some(Self::SaveAddOneSuccess),
            Self::SaveDeleteOne | Self::SaveDeleteOneOptimistic => Some(Self::SaveDeleteOneSuccess),
            Self::SaveUpdateOne | Self::SaveUpdateOneOptimistic => Some(Self::SaveUpdateOneSuccess),
            _ => None,
        }
    }

    /// ERROR kind completing this START kind.
    pub fn error(&self) -> Option<Self> {
        match self {
            Self::QueryAll => Some(Self::QueryAllError),
            Self::QueryMany => Some(Self::QueryManyError),
            Self::QueryByKey => Some(Self::QueryByKeyError),
            Self::SaveAddOne | Self::SaveAddOneOptimistic => Some(Self::SaveAddOneError),
            Self::SaveDeleteOne | Self::SaveDeleteOneOptimistic => Some(Self::SaveDeleteOneError),
            Self::SaveUpdateOne | Self::SaveUpdateOneOptimistic => Some(Self::SaveUpdateOneError),
            _ => None,
        }
    }
}

impl fmt::Display for EntityOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
