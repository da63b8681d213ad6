// ── HTTP data service ──
//
// Adapts a `stashly_api::RestClient` to `EntityCollectionDataService`.
// Transport failures are folded into `DataServiceError`s carrying the
// method and URL of the failed request.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;
use stashly_api::{HttpMethod, ResourceUrls, RestClient};
use tracing::debug;

use super::{DataServiceError, DataServiceFactory, DataServiceResult, EntityCollectionDataService};
use crate::action::QueryParams;
use crate::config::DataServiceConfig;
use crate::error::CoreError;
use crate::model::{EntityKey, Update};

/// REST-backed data service for one entity type.
#[derive(Debug, Clone)]
pub struct HttpDataService {
    name: String,
    client: RestClient,
}

impl HttpDataService {
    pub fn new(entity_name: impl Into<String>, client: RestClient) -> Self {
        Self {
            name: entity_name.into(),
            client,
        }
    }

    /// The URL a keyed request goes to, built the way the client builds it.
    /// Keys the client rejects report the bare entity URL.
    fn entity_url(&self, key: Option<&EntityKey>) -> String {
        let urls = self.client.urls();
        key.and_then(|key| urls.entity_with_key(&key.to_string()).ok())
            .unwrap_or_else(|| urls.entity().clone())
            .to_string()
    }

    fn collection_url(&self) -> String {
        self.client.urls().collection().to_string()
    }
}

impl EntityCollectionDataService for HttpDataService {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_all(&self) -> BoxFuture<'_, DataServiceResult<Vec<Value>>> {
        async move {
            self.client
                .get_all()
                .await
                .map_err(|e| DataServiceError::from_api(&e, HttpMethod::Get, &self.collection_url()))
        }
        .boxed()
    }

    fn get_by_id(&self, key: EntityKey) -> BoxFuture<'_, DataServiceResult<Value>> {
        async move {
            self.client.get_by_id(&key.to_string()).await.map_err(|e| {
                DataServiceError::from_api(&e, HttpMethod::Get, &self.entity_url(Some(&key)))
            })
        }
        .boxed()
    }

    fn get_with_query(&self, params: QueryParams) -> BoxFuture<'_, DataServiceResult<Vec<Value>>> {
        async move {
            let result = match &params {
                QueryParams::Map(_) => {
                    let pairs = params.to_pairs().unwrap_or_default();
                    self.client.get_with_query(&pairs).await
                }
                QueryParams::Raw(raw) => self.client.get_with_raw_query(raw).await,
            };
            result.map_err(|e| DataServiceError::from_api(&e, HttpMethod::Get, &self.collection_url()))
        }
        .boxed()
    }

    fn add(&self, entity: Value) -> BoxFuture<'_, DataServiceResult<Value>> {
        async move {
            self.client
                .add(&entity)
                .await
                .map_err(|e| DataServiceError::from_api(&e, HttpMethod::Post, &self.entity_url(None)))
        }
        .boxed()
    }

    fn delete(&self, key: EntityKey) -> BoxFuture<'_, DataServiceResult<()>> {
        async move {
            self.client.delete(&key.to_string()).await.map_err(|e| {
                DataServiceError::from_api(&e, HttpMethod::Delete, &self.entity_url(Some(&key)))
            })
        }
        .boxed()
    }

    fn update(&self, update: Update) -> BoxFuture<'_, DataServiceResult<Update>> {
        async move {
            let amended = self
                .client
                .update(&update.id.to_string(), &update.changes)
                .await
                .map_err(|e| {
                    DataServiceError::from_api(&e, HttpMethod::Put, &self.entity_url(Some(&update.id)))
                })?;
            Ok(match amended {
                Some(changes) => Update {
                    id: update.id,
                    changes,
                },
                None => update,
            })
        }
        .boxed()
    }
}

// ── Factory ──────────────────────────────────────────────────────────

/// Creates an [`HttpDataService`] per entity type, sharing one HTTP client.
#[derive(Debug, Clone)]
pub struct HttpDataServiceFactory {
    config: DataServiceConfig,
    http: reqwest::Client,
}

impl HttpDataServiceFactory {
    pub fn new(config: DataServiceConfig) -> Result<Self, CoreError> {
        let http = config.transport.build_client()?;
        Ok(Self { config, http })
    }
}

impl DataServiceFactory for HttpDataServiceFactory {
    fn create(&self, entity_name: &str) -> Result<Arc<dyn EntityCollectionDataService>, CoreError> {
        let paths = self.config.paths_for(entity_name);
        let urls = ResourceUrls::new(&self.config.root_url, &paths.entity, &paths.collection)?;
        debug!(
            entity = entity_name,
            collection = %urls.collection(),
            "creating HTTP data service"
        );
        let client = RestClient::with_client(self.http.clone(), urls);
        Ok(Arc::new(HttpDataService::new(entity_name, client)))
    }
}
