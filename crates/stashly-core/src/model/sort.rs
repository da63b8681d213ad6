// ── Sort comparers ──
//
// A collection with a comparer keeps its `ids` sorted by it; without
// one, `ids` keep insertion order.

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::Value;

/// Total order over entities.
pub type SortComparer = Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>;

/// Compare entities by a top-level field. Missing fields sort first;
/// numbers compare numerically, strings lexically.
pub fn sort_by_field(field: impl Into<String>) -> SortComparer {
    let field = field.into();
    Arc::new(move |a: &Value, b: &Value| {
        compare_values(
            a.get(&field).unwrap_or(&Value::Null),
            b.get(&field).unwrap_or(&Value::Null),
        )
    })
}

/// Order JSON scalars. Values of different kinds order by kind:
/// null < bool < number < string < array < object.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x
                    .as_f64()
                    .unwrap_or(f64::NAN)
                    .total_cmp(&y.as_f64().unwrap_or(f64::NAN)),
            }
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
