// ── In-memory data service ──
//
// A process-local stand-in for a REST resource, useful for demos and for
// exercising the pipeline without a server. Numeric keys are assigned on
// add when the entity has none (or a tentative one); failures can be
// injected to drive the ERROR paths.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;
use stashly_api::HttpMethod;

use super::{DataServiceError, DataServiceResult, EntityCollectionDataService};
use crate::action::QueryParams;
use crate::definition::is_temp_key;
use crate::model::{DEFAULT_ID_FIELD, EntityKey, Update, merge};

/// Failure injected into every subsequent call until cleared.
#[derive(Debug, Clone)]
struct InjectedFailure {
    status: u16,
    message: String,
}

/// Data service backed by a concurrent map.
#[derive(Debug)]
pub struct InMemoryDataService {
    name: String,
    id_field: String,
    rows: DashMap<EntityKey, Value>,
    next_id: AtomicI64,
    failure: Mutex<Option<InjectedFailure>>,
}

impl InMemoryDataService {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            name: entity_name.into(),
            id_field: DEFAULT_ID_FIELD.to_owned(),
            rows: DashMap::new(),
            next_id: AtomicI64::new(1),
            failure: Mutex::new(None),
        }
    }

    /// Read and assign keys through `field` instead of `id`.
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Seed the store. Entities without a key are skipped.
    pub fn with_entities(self, entities: impl IntoIterator<Item = Value>) -> Self {
        for entity in entities {
            if let Some(key) = self.key_of(&entity) {
                self.bump_next_id(&key);
                self.rows.insert(key, entity);
            }
        }
        self
    }

    /// Fail every call with `status` until [`clear_failure`](Self::clear_failure).
    pub fn fail_with(&self, status: u16, message: impl Into<String>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(InjectedFailure {
                status,
                message: message.into(),
            });
        }
    }

    pub fn clear_failure(&self) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = None;
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stored entity for `key`.
    pub fn entity(&self, key: &EntityKey) -> Option<Value> {
        self.rows.get(key).map(|r| r.value().clone())
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn key_of(&self, entity: &Value) -> Option<EntityKey> {
        entity.get(&self.id_field).and_then(EntityKey::from_value)
    }

    fn bump_next_id(&self, key: &EntityKey) {
        if let Some(n) = key.as_num() {
            self.next_id.fetch_max(n + 1, Ordering::SeqCst);
        }
    }

    fn url(&self, key: Option<&EntityKey>) -> String {
        let base = self.name.to_lowercase();
        match key {
            Some(key) => format!("memory://{base}/{key}"),
            None => format!("memory://{base}/"),
        }
    }

    fn check(&self, method: HttpMethod, url: &str) -> DataServiceResult<()> {
        let failure = self.failure.lock().ok().and_then(|f| f.clone());
        match failure {
            Some(f) => Err(DataServiceError::new(Some(f.status), f.message, method, url)),
            None => Ok(()),
        }
    }

    fn not_found(method: HttpMethod, url: String, key: &EntityKey) -> DataServiceError {
        DataServiceError::new(Some(404), format!("no entity with key {key}"), method, url)
    }

    fn sorted_rows(&self) -> Vec<Value> {
        let mut rows: Vec<(EntityKey, Value)> = self
            .rows
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows.into_iter().map(|(_, v)| v).collect()
    }
}

/// `true` when every queried field matches one of its values. Values
/// compare against the field's string form.
fn matches_query(entity: &Value, pairs: &[(String, String)]) -> bool {
    pairs.iter().all(|(field, _)| {
        let actual = match entity.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => return false,
        };
        pairs.iter().any(|(f, v)| f == field && *v == actual)
    })
}

impl EntityCollectionDataService for InMemoryDataService {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_all(&self) -> BoxFuture<'_, DataServiceResult<Vec<Value>>> {
        async move {
            self.check(HttpMethod::Get, &self.url(None))?;
            Ok(self.sorted_rows())
        }
        .boxed()
    }

    fn get_by_id(&self, key: EntityKey) -> BoxFuture<'_, DataServiceResult<Value>> {
        async move {
            let url = self.url(Some(&key));
            self.check(HttpMethod::Get, &url)?;
            self.entity(&key)
                .ok_or_else(|| Self::not_found(HttpMethod::Get, url, &key))
        }
        .boxed()
    }

    fn get_with_query(&self, params: QueryParams) -> BoxFuture<'_, DataServiceResult<Vec<Value>>> {
        async move {
            self.check(HttpMethod::Get, &self.url(None))?;
            let pairs: Vec<(String, String)> = match &params {
                QueryParams::Map(_) => params.to_pairs().unwrap_or_default(),
                QueryParams::Raw(raw) => url::form_urlencoded::parse(raw.trim_start_matches('?').as_bytes())
                    .into_owned()
                    .collect(),
            };
            Ok(self
                .sorted_rows()
                .into_iter()
                .filter(|e| matches_query(e, &pairs))
                .collect())
        }
        .boxed()
    }

    fn add(&self, entity: Value) -> BoxFuture<'_, DataServiceResult<Value>> {
        async move {
            let url = self.url(None);
            self.check(HttpMethod::Post, &url)?;
            let Value::Object(mut fields) = entity else {
                return Err(DataServiceError::new(
                    Some(400),
                    "entity must be a JSON object",
                    HttpMethod::Post,
                    url,
                ));
            };

            let key = match fields.get(&self.id_field).and_then(EntityKey::from_value) {
                Some(key) if !is_temp_key(&key) => key,
                _ => {
                    let key = EntityKey::Num(self.next_id.fetch_add(1, Ordering::SeqCst));
                    fields.insert(self.id_field.clone(), key.to_value());
                    key
                }
            };
            self.bump_next_id(&key);

            let saved = Value::Object(fields);
            self.rows.insert(key, saved.clone());
            Ok(saved)
        }
        .boxed()
    }

    fn delete(&self, key: EntityKey) -> BoxFuture<'_, DataServiceResult<()>> {
        async move {
            let url = self.url(Some(&key));
            self.check(HttpMethod::Delete, &url)?;
            self.rows
                .remove(&key)
                .map(|_| ())
                .ok_or_else(|| Self::not_found(HttpMethod::Delete, url, &key))
        }
        .boxed()
    }

    fn update(&self, update: Update) -> BoxFuture<'_, DataServiceResult<Update>> {
        async move {
            let url = self.url(Some(&update.id));
            self.check(HttpMethod::Put, &url)?;
            let mut row = self
                .rows
                .get_mut(&update.id)
                .ok_or_else(|| Self::not_found(HttpMethod::Put, url, &update.id))?;
            let merged = merge(row.value(), &update.changes);
            *row.value_mut() = merged;
            Ok(update)
        }
        .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn heroes() -> InMemoryDataService {
        InMemoryDataService::new("Hero").with_entities([
            json!({ "id": 1, "name": "Windstorm", "power": "wind" }),
            json!({ "id": 2, "name": "Magneta", "power": "magnet" }),
        ])
    }

    #[tokio::test]
    async fn get_all_returns_rows_in_key_order() {
        let svc = heroes();
        let all = svc.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0]["name"], "Windstorm");
    }

    #[tokio::test]
    async fn add_assigns_next_numeric_key() {
        let svc = heroes();
        let saved = svc.add(json!({ "name": "Bombasto" })).await.unwrap();
        assert_eq!(saved["id"], 3);
        assert_eq!(svc.len(), 3);
    }

    #[tokio::test]
    async fn add_replaces_tentative_key() {
        let svc = heroes();
        let saved = svc
            .add(json!({ "id": "tmp-123", "name": "Bombasto" }))
            .await
            .unwrap();
        assert_eq!(saved["id"], 3);
    }

    #[tokio::test]
    async fn query_filters_by_field() {
        let svc = heroes();
        let found = svc
            .get_with_query(QueryParams::from_pairs([("power", "wind")]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let found = svc
            .get_with_query(QueryParams::from("id=2"))
            .await
            .unwrap();
        assert_eq!(found[0]["name"], "Magneta");
    }

    #[tokio::test]
    async fn update_merges_changes() {
        let svc = heroes();
        svc.update(Update::new(1, json!({ "name": "Gale" })))
            .await
            .unwrap();
        assert_eq!(
            svc.entity(&EntityKey::Num(1)).unwrap(),
            json!({ "id": 1, "name": "Gale", "power": "wind" })
        );
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let svc = heroes();
        let err = svc.delete(EntityKey::Num(9)).await.unwrap_err();
        assert_eq!(err.status, Some(404));
        assert_eq!(err.method, HttpMethod::Delete);
        assert_eq!(err.url, "memory://hero/9");
    }

    #[tokio::test]
    async fn injected_failure_applies_until_cleared() {
        let svc = heroes();
        svc.fail_with(500, "boom");
        let err = svc.get_all().await.unwrap_err();
        assert_eq!(err.status, Some(500));

        svc.clear_failure();
        assert!(svc.get_all().await.is_ok());
    }
}
