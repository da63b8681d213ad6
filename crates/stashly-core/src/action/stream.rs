// ── Operation stream ──
//
// Every operation the controller reduces is republished on a broadcast
// channel. `EntityActions` wraps a receiver with entity-type and kind
// filters. `next` skips over lag; `completion_of` gives up on it, since
// the completion it waits for may be among the skipped operations.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use super::{EntityOp, EntityOperation};

/// Filtered subscription to the stream of reduced operations.
pub struct EntityActions {
    receiver: broadcast::Receiver<Arc<EntityOperation>>,
    entity_names: Vec<String>,
    ops: Vec<EntityOp>,
}

impl EntityActions {
    pub(crate) fn new(receiver: broadcast::Receiver<Arc<EntityOperation>>) -> Self {
        Self {
            receiver,
            entity_names: Vec::new(),
            ops: Vec::new(),
        }
    }

    /// Only pass operations for these entity types. Empty means any.
    pub fn of_entity_type<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.entity_names = names.into_iter().map(|n| n.as_ref().trim().to_owned()).collect();
        self
    }

    /// Only pass operations of these kinds. Empty means any.
    pub fn of_op(mut self, ops: impl IntoIterator<Item = EntityOp>) -> Self {
        self.ops = ops.into_iter().collect();
        self
    }

    fn accepts(&self, op: &EntityOperation) -> bool {
        let name_ok = self.entity_names.is_empty()
            || self.entity_names.iter().any(|n| n == op.entity_name());
        let op_ok = self.ops.is_empty() || self.ops.contains(op.op());
        name_ok && op_ok
    }

    /// Next matching operation. Returns `None` once the controller is gone.
    pub async fn next(&mut self) -> Option<Arc<EntityOperation>> {
        loop {
            match self.receiver.recv().await {
                Ok(op) if self.accepts(&op) => return Some(op),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "operation subscriber lagged; skipped operations");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the SUCCESS or ERROR completion of `start`.
    ///
    /// Returns `None` once the controller is gone, or as soon as this
    /// subscriber lags: the completion may have been dropped with the
    /// skipped operations and would never arrive.
    pub async fn completion_of(
        &mut self,
        start: &Arc<EntityOperation>,
    ) -> Option<Arc<EntityOperation>> {
        loop {
            match self.receiver.recv().await {
                Ok(op) if op.completes(start) => return Some(op),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        skipped,
                        entity_name = start.entity_name(),
                        op = ?start.op(),
                        "operation subscriber lagged while awaiting a completion"
                    );
                    return None;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
