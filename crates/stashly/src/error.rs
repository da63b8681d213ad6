//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use stashly_config::ConfigError;
use stashly_core::{CoreError, DataServiceError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Remote ───────────────────────────────────────────────────────
    #[error("{operation} failed")]
    #[diagnostic(code(stashly::data_service))]
    DataService {
        operation: String,
        #[source]
        source: DataServiceError,
    },

    #[error("{entity} '{key}' not found")]
    #[diagnostic(
        code(stashly::not_found),
        help("Run: stashly get-all {entity} to see available keys")
    )]
    NotFound { entity: String, key: String },

    #[error("No completion was observed for {operation}")]
    #[diagnostic(
        code(stashly::stopped),
        help("The synchronization pipeline stopped or fell behind its operation stream")
    )]
    Stopped { operation: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(stashly::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(stashly::json), help("Pass a JSON object, or @path to a file holding one."))]
    Json(#[from] serde_json::Error),

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(stashly::config),
        help("Expected a TOML file with [server] and [entities.<Name>] sections.")
    )]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(stashly::core))]
    Core(CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DataService { source, .. } => match source.status {
                None => exit_code::CONNECTION,
                Some(404) => exit_code::NOT_FOUND,
                Some(409) => exit_code::CONFLICT,
                Some(_) => exit_code::GENERAL,
            },
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::Json(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation {
                entity_name,
                op,
                message,
            } => CliError::Validation {
                field: format!("{op} [{entity_name}]"),
                reason: message,
            },
            CoreError::DataService(source) => CliError::DataService {
                operation: format!("{} {}", source.method, source.url),
                source,
            },
            other => CliError::Core(other),
        }
    }
}
