// ── Reactive cache streams ──
//
// Subscription types for consuming cache snapshots from the controller.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::{EntityCache, EntityCollection};

pub use filter::{EntityFilterFn, props_filter};

/// A subscription to the entity cache.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed()`](Self::changed) or by converting into a `Stream`.
pub struct EntityCacheStream {
    current: Arc<EntityCache>,
    receiver: watch::Receiver<Arc<EntityCache>>,
}

impl EntityCacheStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<EntityCache>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<EntityCache> {
        &self.current
    }

    /// Latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<EntityCache> {
        self.receiver.borrow().clone()
    }

    /// Latest state of one collection, if it has been created.
    pub fn collection(&self, entity_name: &str) -> Option<Arc<EntityCollection>> {
        self.receiver.borrow().get(entity_name).cloned()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the controller has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<EntityCache>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> EntityCacheWatchStream {
        EntityCacheWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current snapshot first, then one per reduction that
/// changed the cache.
pub struct EntityCacheWatchStream {
    inner: WatchStream<Arc<EntityCache>>,
}

impl Stream for EntityCacheWatchStream {
    type Item = Arc<EntityCache>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
