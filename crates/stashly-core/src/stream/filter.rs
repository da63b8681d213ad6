// ── Filter predicates for collection reads ──
//
// Applied on demand by selectors; the reducer only stores the pattern.

use std::sync::Arc;

use serde_json::Value;

/// `(entities, pattern) -> matching entities`.
pub type EntityFilterFn = Arc<dyn Fn(&[Arc<Value>], &str) -> Vec<Arc<Value>> + Send + Sync>;

/// Match entities whose named string properties contain the pattern,
/// ignoring case. An empty (or blank) pattern passes everything.
pub fn props_filter<I, S>(props: I) -> EntityFilterFn
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let props: Vec<String> = props.into_iter().map(Into::into).collect();
    Arc::new(move |entities: &[Arc<Value>], pattern: &str| {
        let needle = pattern.trim().to_lowercase();
        if needle.is_empty() {
            return entities.to_vec();
        }
        entities
            .iter()
            .filter(|e| {
                props.iter().any(|p| {
                    e.get(p)
                        .and_then(Value::as_str)
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
            })
            .cloned()
            .collect()
    })
}
