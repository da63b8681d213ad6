// ── Reducers ──
//
// Pure state transitions: the collection reducer for one entity type,
// the cache reducer routing across types, and the interceptor chain
// wrapped around both.

pub mod cache;
pub mod collection;
pub mod interceptor;

pub use cache::EntityCacheReducer;
pub use collection::{DefaultCollectionReducer, EntityCollectionReducer, ReduceResult};
pub use interceptor::{EntityCollectionInterceptor, Next, TracingInterceptor};
