//! Normalized entity cache with optimistic writes and a REST
//! synchronization pipeline.
//!
//! The cache holds one [`EntityCollection`] per entity type. Every change
//! is an [`EntityOperation`] reduced by pure functions; persistence
//! operations additionally travel through the data services and come back
//! as SUCCESS or ERROR completions:
//!
//! - **[`Controller`]**: Single owner of the cache. [`dispatch()`](Controller::dispatch)
//!   reduces an operation and publishes the new snapshot plus the operation;
//!   [`start()`](Controller::start) spawns the synchronization pipeline.
//!
//! - **[`EntityDispatcher`]**: Per-type command front-end (`add`, `delete`,
//!   `update`, `get_all`, cache-only commands). Optimistic saves mutate the
//!   cache at once and roll back on ERROR.
//!
//! - **Reducers** ([`reducer`]): [`DefaultCollectionReducer`] implements
//!   every operation kind; [`EntityCacheReducer`] routes by entity type
//!   through a chain of [`EntityCollectionInterceptor`]s.
//!
//! - **Data services** ([`data_service`]): The
//!   [`EntityCollectionDataService`] trait, a REST implementation over
//!   `stashly-api`, and an in-memory one for tests and demos.
//!
//! - **Reads**: [`EntitySelectors`] project one collection;
//!   [`EntityCacheStream`] and [`EntityActions`] follow snapshots and
//!   operations as they happen.

pub mod action;
pub mod config;
pub mod controller;
pub mod data_service;
pub mod definition;
pub mod dispatcher;
pub mod effects;
pub mod error;
pub mod model;
pub mod reducer;
pub mod selectors;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::{
    EntityActionError, EntityActionGuard, EntityActions, EntityOp, EntityOperation, EntityPayload,
    QueryParams,
};
pub use config::{CacheConfig, DataServiceConfig, DispatcherOptions, ResourcePaths};
pub use controller::Controller;
pub use data_service::{
    DataServiceError, DataServiceFactory, EntityCollectionDataService, EntityDataService,
    HttpDataService, HttpDataServiceFactory, InMemoryDataService,
};
pub use definition::{EntityDefinition, EntityDefinitionService, EntityMetadata};
pub use dispatcher::{EntityDispatcher, EntityOrKey, OperationSink};
pub use effects::EntityEffects;
pub use error::CoreError;
pub use model::{EntityKey, IdSelector, SortComparer, Update};
pub use reducer::{
    DefaultCollectionReducer, EntityCacheReducer, EntityCollectionInterceptor,
    EntityCollectionReducer, TracingInterceptor,
};
pub use selectors::EntitySelectors;
pub use stashly_api::HttpMethod;
pub use store::{EntityCache, EntityCollection};
pub use stream::{EntityCacheStream, EntityFilterFn, props_filter};
