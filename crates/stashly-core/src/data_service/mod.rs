// ── Data-service collaborator ──
//
// The network side of the pipeline. Each entity type talks to one
// `EntityCollectionDataService`; the `EntityDataService` registry hands
// them out by name, lazily creating missing ones through a factory.

pub mod http;
pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use serde_json::Value;
use stashly_api::HttpMethod;
use thiserror::Error;

use crate::action::QueryParams;
use crate::error::CoreError;
use crate::model::{EntityKey, Update};

pub use http::{HttpDataService, HttpDataServiceFactory};
pub use memory::InMemoryDataService;

// ── DataServiceError ─────────────────────────────────────────────────

/// A failed data-service call: status, message, and the request that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{method} {url} failed{}: {message}", .status.map(|s| format!(" with HTTP {s}")).unwrap_or_default())]
pub struct DataServiceError {
    /// HTTP status if the server answered at all.
    pub status: Option<u16>,
    pub message: String,
    pub method: HttpMethod,
    pub url: String,
}

impl DataServiceError {
    pub fn new(
        status: Option<u16>,
        message: impl Into<String>,
        method: HttpMethod,
        url: impl Into<String>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            method,
            url: url.into(),
        }
    }

    /// Fold a transport error into a data-service error. The request's
    /// own method and URL win over the fallbacks when the error has them.
    pub fn from_api(err: &stashly_api::Error, method: HttpMethod, url: &str) -> Self {
        Self {
            status: err.status(),
            message: err.message(),
            method: err.method().unwrap_or(method),
            url: err.url().unwrap_or(url).to_owned(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

// ── Collection data service ──────────────────────────────────────────

/// Result of a data-service call.
pub type DataServiceResult<T> = Result<T, DataServiceError>;

/// Remote persistence for one entity type.
///
/// Object safe: implementations return boxed futures so that services of
/// different concrete types share one registry.
pub trait EntityCollectionDataService: Send + Sync {
    /// Entity type this service persists.
    fn name(&self) -> &str;

    fn get_all(&self) -> BoxFuture<'_, DataServiceResult<Vec<Value>>>;

    /// One entity by key. `Value::Null` means the server returned nothing.
    fn get_by_id(&self, key: EntityKey) -> BoxFuture<'_, DataServiceResult<Value>>;

    fn get_with_query(&self, params: QueryParams) -> BoxFuture<'_, DataServiceResult<Vec<Value>>>;

    /// Save a new entity; resolves to the server-confirmed entity.
    fn add(&self, entity: Value) -> BoxFuture<'_, DataServiceResult<Value>>;

    fn delete(&self, key: EntityKey) -> BoxFuture<'_, DataServiceResult<()>>;

    /// Save changes; resolves to the (possibly server-amended) update.
    fn update(&self, update: Update) -> BoxFuture<'_, DataServiceResult<Update>>;
}

/// Creates data services for entity types without an explicit registration.
pub trait DataServiceFactory: Send + Sync {
    fn create(&self, entity_name: &str) -> Result<Arc<dyn EntityCollectionDataService>, CoreError>;
}

// ── Registry ─────────────────────────────────────────────────────────

/// Registry of data services keyed by entity-type name.
#[derive(Default)]
pub struct EntityDataService {
    services: DashMap<String, Arc<dyn EntityCollectionDataService>>,
    factory: Option<Arc<dyn DataServiceFactory>>,
}

impl std::fmt::Debug for EntityDataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("EntityDataService")
            .field("services", &names)
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

impl EntityDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that falls back to `factory` for unregistered names.
    pub fn with_factory(factory: Arc<dyn DataServiceFactory>) -> Self {
        Self {
            services: DashMap::new(),
            factory: Some(factory),
        }
    }

    /// Register (or replace) the service for `entity_name`.
    pub fn register_service(
        &self,
        entity_name: impl AsRef<str>,
        service: Arc<dyn EntityCollectionDataService>,
    ) {
        self.services
            .insert(entity_name.as_ref().trim().to_owned(), service);
    }

    pub fn register_services(&self, services: HashMap<String, Arc<dyn EntityCollectionDataService>>) {
        for (name, service) in services {
            self.register_service(name, service);
        }
    }

    /// Service for `entity_name`, creating and caching one through the
    /// factory when none is registered.
    pub fn get_service(
        &self,
        entity_name: &str,
    ) -> Result<Arc<dyn EntityCollectionDataService>, CoreError> {
        let entity_name = entity_name.trim();
        if let Some(service) = self.services.get(entity_name) {
            return Ok(Arc::clone(service.value()));
        }

        let factory = self.factory.as_ref().ok_or_else(|| CoreError::NoDataService {
            entity_name: entity_name.to_owned(),
        })?;
        let service = factory.create(entity_name)?;
        let entry = self
            .services
            .entry(entity_name.to_owned())
            .or_insert(service);
        Ok(Arc::clone(entry.value()))
    }
}
