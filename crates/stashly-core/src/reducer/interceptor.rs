// ── Reducer interceptors ──
//
// Interceptors wrap every collection reduction. They nest in registration
// order: the first one registered sees the operation first and the result
// last.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::collection::{EntityCollectionReducer, ReduceResult};
use crate::action::EntityOperation;
use crate::store::EntityCollection;

/// The rest of the chain, down to the collection reducer.
pub type Next<'a> = &'a dyn Fn(Arc<EntityCollection>, &EntityOperation) -> ReduceResult;

/// Observes or transforms an operation around the inner reduction.
pub trait EntityCollectionInterceptor: Send + Sync {
    fn intercept(
        &self,
        collection: Arc<EntityCollection>,
        op: &EntityOperation,
        next: Next<'_>,
    ) -> ReduceResult;
}

impl<F> EntityCollectionInterceptor for F
where
    F: Fn(Arc<EntityCollection>, &EntityOperation, Next<'_>) -> ReduceResult + Send + Sync,
{
    fn intercept(
        &self,
        collection: Arc<EntityCollection>,
        op: &EntityOperation,
        next: Next<'_>,
    ) -> ReduceResult {
        self(collection, op, next)
    }
}

/// Run `op` through `interceptors` (outermost first) and then `inner`.
pub(crate) fn run_chain(
    interceptors: &[Arc<dyn EntityCollectionInterceptor>],
    inner: &dyn EntityCollectionReducer,
    collection: Arc<EntityCollection>,
    op: &EntityOperation,
) -> ReduceResult {
    match interceptors.split_first() {
        None => inner.reduce(collection, op),
        Some((outer, rest)) => outer.intercept(
            collection,
            op,
            &|c: Arc<EntityCollection>, o: &EntityOperation| run_chain(rest, inner, c, o),
        ),
    }
}

// ── Tracing ──────────────────────────────────────────────────────────

/// Logs every reduction: the operation at `debug`, the outcome at `trace`,
/// rejections at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInterceptor;

impl EntityCollectionInterceptor for TracingInterceptor {
    fn intercept(
        &self,
        collection: Arc<EntityCollection>,
        op: &EntityOperation,
        next: Next<'_>,
    ) -> ReduceResult {
        debug!(op = %op.type_label(), payload = op.payload().kind_name(), "reducing");
        let before = Arc::clone(&collection);
        match next(collection, op) {
            Ok(after) => {
                trace!(
                    op = %op.type_label(),
                    changed = !Arc::ptr_eq(&before, &after),
                    count = after.len(),
                    "reduced"
                );
                Ok(after)
            }
            Err(e) => {
                warn!(op = %op.type_label(), error = %e, "operation rejected");
                Err(e)
            }
        }
    }
}
