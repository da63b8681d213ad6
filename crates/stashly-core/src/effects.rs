// ── Synchronization pipeline ──
//
// Filter+map stage over reduced operations: each persistence START calls
// the entity type's data service and yields exactly one SUCCESS or ERROR
// completion. Failures never escape as errors; they become ERROR
// completions carrying the original operation.

use std::sync::Arc;

use stashly_api::HttpMethod;
use tracing::{debug, warn};

use crate::action::{EntityOp, EntityOperation, EntityPayload, QueryParams};
use crate::data_service::{DataServiceError, EntityDataService};
use crate::definition::EntityDefinitionService;

/// Turns persistence STARTs into completion operations.
#[derive(Debug, Clone)]
pub struct EntityEffects {
    data_services: Arc<EntityDataService>,
    definitions: Arc<EntityDefinitionService>,
}

impl EntityEffects {
    pub fn new(
        data_services: Arc<EntityDataService>,
        definitions: Arc<EntityDefinitionService>,
    ) -> Self {
        Self {
            data_services,
            definitions,
        }
    }

    /// Completion for `op`, or `None` if `op` is not a persistence START.
    pub async fn persist(&self, op: Arc<EntityOperation>) -> Option<EntityOperation> {
        if !op.op().is_persist() {
            return None;
        }

        debug!(op = %op.type_label(), "persisting");
        match self.call(&op).await {
            Ok(payload) => EntityOperation::success_of(&op, payload),
            Err(error) => {
                warn!(op = %op.type_label(), %error, "data service call failed");
                EntityOperation::error_of(&op, error)
            }
        }
    }

    async fn call(&self, op: &EntityOperation) -> Result<EntityPayload, DataServiceError> {
        let service = self
            .data_services
            .get_service(op.entity_name())
            .map_err(|e| local_error(op, e.to_string()))?;

        match (op.op(), op.payload()) {
            (EntityOp::QueryAll, _) => service.get_all().await.map(EntityPayload::Entities),

            (EntityOp::QueryMany, EntityPayload::Query(params)) => service
                .get_with_query(params.clone())
                .await
                .map(EntityPayload::Entities),
            (EntityOp::QueryMany, EntityPayload::None) => service
                .get_with_query(QueryParams::Map(std::collections::BTreeMap::new()))
                .await
                .map(EntityPayload::Entities),

            (EntityOp::QueryByKey, EntityPayload::Key(key)) => {
                let entity = service.get_by_id(key.clone()).await?;
                Ok(if entity.is_null() {
                    EntityPayload::None
                } else {
                    EntityPayload::Entity(entity)
                })
            }

            (EntityOp::SaveAddOne | EntityOp::SaveAddOneOptimistic, EntityPayload::Entity(entity)) => {
                let body = match self.definitions.get_definition(op.entity_name()) {
                    Ok(def) => def.strip_temp_key(entity),
                    Err(_) => entity.clone(),
                };
                service.add(body).await.map(EntityPayload::Entity)
            }

            (EntityOp::SaveDeleteOne | EntityOp::SaveDeleteOneOptimistic, EntityPayload::Key(key)) => {
                service.delete(key.clone()).await?;
                Ok(EntityPayload::Key(key.clone()))
            }

            (EntityOp::SaveUpdateOne | EntityOp::SaveUpdateOneOptimistic, EntityPayload::Update(update)) => {
                service.update(update.clone()).await.map(EntityPayload::Update)
            }

            (_, payload) => Err(local_error(
                op,
                format!("unexpected {} payload", payload.kind_name()),
            )),
        }
    }
}

/// HTTP verb a persistence kind maps onto.
fn method_for(op: &EntityOp) -> HttpMethod {
    match op {
        EntityOp::SaveAddOne | EntityOp::SaveAddOneOptimistic => HttpMethod::Post,
        EntityOp::SaveDeleteOne | EntityOp::SaveDeleteOneOptimistic => HttpMethod::Delete,
        EntityOp::SaveUpdateOne | EntityOp::SaveUpdateOneOptimistic => HttpMethod::Put,
        _ => HttpMethod::Get,
    }
}

/// Failure detected before any request was made.
fn local_error(op: &EntityOperation, message: String) -> DataServiceError {
    DataServiceError::new(None, message, method_for(op.op()), "")
}
