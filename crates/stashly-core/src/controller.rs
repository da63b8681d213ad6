// ── Controller ──
//
// Single owner of the entity cache. Operations are reduced one at a time
// under the snapshot channel's write lock; the resulting snapshot and the
// operation itself are published in the same critical section, so the
// snapshot stream and the action stream observe one order. Persistence
// STARTs are handed to the synchronization pipeline, whose completions
// come back through `dispatch` like any other operation.

use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::{EntityActions, EntityOperation};
use crate::config::CacheConfig;
use crate::data_service::EntityDataService;
use crate::definition::EntityDefinitionService;
use crate::dispatcher::{EntityDispatcher, OperationSink};
use crate::effects::EntityEffects;
use crate::error::CoreError;
use crate::reducer::{EntityCacheReducer, EntityCollectionInterceptor};
use crate::selectors::EntitySelectors;
use crate::store::EntityCache;
use crate::stream::EntityCacheStream;

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Reduction works as soon
/// as the controller exists; persistence STARTs queue up until
/// [`start()`](Self::start) spawns the synchronization pipeline.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: CacheConfig,
    reducer: EntityCacheReducer,
    effects: EntityEffects,
    state: watch::Sender<Arc<EntityCache>>,
    actions: broadcast::Sender<Arc<EntityOperation>>,
    persist_tx: mpsc::UnboundedSender<Arc<EntityOperation>>,
    persist_rx: Mutex<Option<mpsc::UnboundedReceiver<Arc<EntityOperation>>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("config", &self.inner.config)
            .field("reducer", &self.inner.reducer)
            .field("stopped", &self.inner.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Controller with one default reducer per definition, wrapped by
    /// `interceptors` (first is outermost).
    pub fn new(
        config: CacheConfig,
        definitions: Arc<EntityDefinitionService>,
        data_services: Arc<EntityDataService>,
        interceptors: Vec<Arc<dyn EntityCollectionInterceptor>>,
    ) -> Self {
        let reducer = EntityCacheReducer::new(definitions, interceptors);
        Self::with_reducer(config, reducer, data_services)
    }

    /// Controller around a prepared cache reducer, e.g. one with custom
    /// per-type reducers registered.
    pub fn with_reducer(
        config: CacheConfig,
        reducer: EntityCacheReducer,
        data_services: Arc<EntityDataService>,
    ) -> Self {
        let effects = EntityEffects::new(data_services, Arc::clone(reducer.definitions()));
        let (state, _) = watch::channel(Arc::new(EntityCache::new()));
        let (actions, _) = broadcast::channel(config.action_channel_size.max(1));
        let (persist_tx, persist_rx) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                reducer,
                effects,
                state,
                actions,
                persist_tx,
                persist_rx: Mutex::new(Some(persist_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub fn definitions(&self) -> &Arc<EntityDefinitionService> {
        self.inner.reducer.definitions()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the synchronization pipeline. Calling it again is a no-op.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::ControllerStopped);
        }
        let Some(rx) = self.inner.persist_rx.lock().await.take() else {
            debug!("synchronization pipeline already running");
            return Ok(());
        };

        let inner = Arc::downgrade(&self.inner);
        let cancel = self.inner.cancel.clone();
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(pipeline_task(inner, rx, cancel)));

        info!(
            entity_types = self.definitions().names().len(),
            "synchronization pipeline started"
        );
        Ok(())
    }

    /// Stop the pipeline. In-flight data-service calls are abandoned and
    /// produce no completion; later dispatches fail with
    /// [`CoreError::ControllerStopped`]. Dropping the last handle without
    /// calling this also stops the pipeline, but does not wait for it.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("controller stopped");
    }

    /// Run `f` against a started controller, then shut it down.
    pub async fn oneshot<F, Fut, T>(self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        self.start().await?;
        let result = f(self.clone()).await;
        self.shutdown().await;
        result
    }

    // ── Dispatch ─────────────────────────────────────────────────

    /// Reduce `op` into the cache and publish it.
    ///
    /// Returns the shared operation that completions will reference. An
    /// operation for an unknown entity type fails here and is neither
    /// published nor persisted.
    pub fn dispatch(&self, op: EntityOperation) -> Result<Arc<EntityOperation>, CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::ControllerStopped);
        }

        let op = Arc::new(op);
        let mut outcome = Ok(());
        self.inner.state.send_if_modified(|cache| {
            match self.inner.reducer.reduce(cache, &op) {
                Ok(next) => {
                    let changed = !Arc::ptr_eq(&next, cache);
                    *cache = next;
                    if op.op().is_persist() {
                        let _ = self.inner.persist_tx.send(Arc::clone(&op));
                    }
                    // No subscribers is fine.
                    let _ = self.inner.actions.send(Arc::clone(&op));
                    changed
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome.map(|()| op)
    }

    /// Command front-end for `entity_name`.
    pub fn dispatcher(&self, entity_name: &str) -> Result<EntityDispatcher, CoreError> {
        let definition = self.definitions().get_definition(entity_name)?;
        Ok(EntityDispatcher::new(
            definition,
            self.inner.config.dispatcher,
            Arc::new(self.clone()),
        ))
    }

    // ── State observation ────────────────────────────────────────

    /// Read-side projections for `entity_name`.
    pub fn selectors(&self, entity_name: &str) -> Result<EntitySelectors, CoreError> {
        let definition = self.definitions().get_definition(entity_name)?;
        Ok(EntitySelectors::new(definition, self.inner.state.subscribe()))
    }

    /// Current cache snapshot.
    pub fn snapshot(&self) -> Arc<EntityCache> {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to cache snapshots.
    pub fn subscribe(&self) -> EntityCacheStream {
        EntityCacheStream::new(self.inner.state.subscribe())
    }

    /// Subscribe to operations as they are reduced. Only operations
    /// dispatched after this call are seen.
    pub fn actions(&self) -> EntityActions {
        EntityActions::new(self.inner.actions.subscribe())
    }
}

impl OperationSink for Controller {
    fn dispatch(&self, op: EntityOperation) -> Result<Arc<EntityOperation>, CoreError> {
        Controller::dispatch(self, op)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Feeds persistence STARTs to the data services, one task per call, so
/// completions arrive in response order.
///
/// Holds the controller weakly: once the last [`Controller`] handle is
/// dropped the queue's sender goes with it and the loop ends.
async fn pipeline_task(
    inner: Weak<ControllerInner>,
    mut rx: mpsc::UnboundedReceiver<Arc<EntityOperation>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = rx.recv() => {
                let Some(op) = next else { break };
                let Some(inner) = inner.upgrade() else { break };
                tokio::spawn(persist_task(Controller { inner }, op, cancel.clone()));
            }
        }
    }
    debug!("synchronization pipeline exited");
}

async fn persist_task(ctrl: Controller, op: Arc<EntityOperation>, cancel: CancellationToken) {
    let completion = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        completion = ctrl.inner.effects.persist(Arc::clone(&op)) => completion,
    };
    let Some(completion) = completion else {
        return;
    };
    if let Err(e) = ctrl.dispatch(completion) {
        warn!(op = %op.type_label(), error = %e, "completion was not applied");
    }
}
