// ── Entity identity ──
//
// EntityKey is the primary key of every cached entity. It unifies numeric
// and string keys behind one hashable, orderable type so collections can be
// keyed uniformly whatever the remote API uses.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── EntityKey ───────────────────────────────────────────────────────

/// Primary key of a cached entity: a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKey {
    Num(i64),
    Str(String),
}

impl EntityKey {
    /// Read a key out of a JSON value. Integers and non-empty strings
    /// qualify; anything else (null, floats, objects, "") does not.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Num),
            Value::String(s) if !s.is_empty() => Some(Self::Str(s.clone())),
            _ => None,
        }
    }

    /// The key as a JSON value, suitable for writing back into an entity.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Num(n) => Value::from(*n),
            Self::Str(s) => Value::from(s.as_str()),
        }
    }

    pub fn as_num(&self) -> Option<i64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Num(_) => None,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Numeric strings parse as `Num`, everything else as `Str`.
impl FromStr for EntityKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map_or_else(|_| Self::Str(s.to_owned()), Self::Num))
    }
}

impl From<i64> for EntityKey {
    fn from(n: i64) -> Self {
        Self::Num(n)
    }
}

impl From<i32> for EntityKey {
    fn from(n: i32) -> Self {
        Self::Num(i64::from(n))
    }
}

impl From<u32> for EntityKey {
    fn from(n: u32) -> Self {
        Self::Num(i64::from(n))
    }
}

impl From<String> for EntityKey {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for EntityKey {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

// ── Key selection ───────────────────────────────────────────────────

/// Extracts the primary key from an entity or partial entity.
pub type IdSelector = Arc<dyn Fn(&Value) -> Option<EntityKey> + Send + Sync>;

/// Name of the field the default selector reads.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Selector reading the conventional `id` field.
pub fn default_select_id() -> IdSelector {
    select_id_by_field(DEFAULT_ID_FIELD)
}

/// Selector reading a named top-level field.
pub fn select_id_by_field(field: impl Into<String>) -> IdSelector {
    let field = field.into();
    Arc::new(move |entity: &Value| entity.get(&field).and_then(EntityKey::from_value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_from_numeric_value() {
        assert_eq!(EntityKey::from_value(&json!(42)), Some(EntityKey::Num(42)));
    }

    #[test]
    fn key_from_string_value() {
        assert_eq!(
            EntityKey::from_value(&json!("forty-two")),
            Some(EntityKey::Str("forty-two".into()))
        );
    }

    #[test]
    fn empty_string_null_and_float_are_not_keys() {
        assert_eq!(EntityKey::from_value(&json!("")), None);
        assert_eq!(EntityKey::from_value(&Value::Null), None);
        assert_eq!(EntityKey::from_value(&json!(1.5)), None);
    }

    #[test]
    fn key_from_str_detects_numbers() {
        let key: EntityKey = "42".parse().unwrap();
        assert_eq!(key, EntityKey::Num(42));
        let key: EntityKey = "abc".parse().unwrap();
        assert_eq!(key, EntityKey::Str("abc".into()));
    }

    #[test]
    fn key_display() {
        assert_eq!(EntityKey::Num(7).to_string(), "7");
        assert_eq!(EntityKey::from("villain-1").to_string(), "villain-1");
    }

    #[test]
    fn key_round_trips_through_json_value() {
        let key = EntityKey::from("k");
        assert_eq!(EntityKey::from_value(&key.to_value()), Some(key));
    }

    #[test]
    fn default_selector_reads_id() {
        let select = default_select_id();
        assert_eq!(select(&json!({ "id": 1, "name": "A" })), Some(EntityKey::Num(1)));
        assert_eq!(select(&json!({ "name": "A" })), None);
    }

    #[test]
    fn field_selector_reads_named_field() {
        let select = select_id_by_field("key");
        assert_eq!(
            select(&json!({ "key": "v1", "id": 3 })),
            Some(EntityKey::Str("v1".into()))
        );
    }
}
