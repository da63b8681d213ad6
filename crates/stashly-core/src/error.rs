// ── Core error types ──
//
// Errors raised synchronously by stashly-core. Remote failures are not
// in here: those become ERROR completion operations carrying a
// `DataServiceError` and never surface as a rejected call.

use thiserror::Error;

use crate::data_service::DataServiceError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Validation errors ────────────────────────────────────────────
    #[error("Invalid {op} for {entity_name}: {message}")]
    Validation {
        entity_name: String,
        op: String,
        message: String,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("No EntityDefinition for entity type \"{entity_name}\"")]
    UnknownEntityType { entity_name: String },

    #[error("No data service registered for entity type \"{entity_name}\"")]
    NoDataService { entity_name: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Runtime errors ───────────────────────────────────────────────
    #[error("Controller is not running")]
    ControllerStopped,

    #[error(transparent)]
    DataService(#[from] DataServiceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

/// Transport errors reaching core outside a data-service call come from
/// building clients or URLs, so they are configuration problems.
impl From<stashly_api::Error> for CoreError {
    fn from(err: stashly_api::Error) -> Self {
        CoreError::Config {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Internal(format!("JSON conversion failed: {err}"))
    }
}
