//! Helpers shared by the command handlers.

use std::sync::Arc;

use serde_json::Value;

use stashly_core::{Controller, CoreError, EntityDispatcher, EntityOperation};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Submit one operation and wait for its completion.
///
/// An ERROR completion becomes [`CliError::DataService`].
pub async fn run_to_completion<F>(
    controller: &Controller,
    entity: &str,
    submit: F,
) -> Result<Arc<EntityOperation>, CliError>
where
    F: FnOnce(&EntityDispatcher) -> Result<Arc<EntityOperation>, CoreError>,
{
    let dispatcher = controller.dispatcher(entity)?;
    // Subscribe before submitting so the completion cannot be missed.
    let mut actions = controller.actions().of_entity_type([entity]);
    let start = submit(&dispatcher)?;

    let done = actions
        .completion_of(&start)
        .await
        .ok_or_else(|| CliError::Stopped {
            operation: start.type_label(),
        })?;

    if let Some(error) = done.data_service_error() {
        return Err(CliError::DataService {
            operation: start.type_label(),
            source: error.clone(),
        });
    }
    Ok(done)
}

/// Parse a JSON argument, reading it from a file when it starts with `@`.
pub fn parse_json_arg(arg: &str) -> Result<Value, CliError> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => arg.to_owned(),
    };
    let value: Value = serde_json::from_str(&text)?;
    if !value.is_object() {
        return Err(CliError::Validation {
            field: "json".into(),
            reason: "expected a JSON object".into(),
        });
    }
    Ok(value)
}

/// Split `name=value` pairs.
pub fn parse_query_params(params: &[String]) -> Result<Vec<(String, String)>, CliError> {
    params
        .iter()
        .map(|param| {
            param
                .split_once('=')
                .filter(|(name, _)| !name.trim().is_empty())
                .map(|(name, value)| (name.trim().to_owned(), value.to_owned()))
                .ok_or_else(|| CliError::Validation {
                    field: "query".into(),
                    reason: format!("expected name=value, got '{param}'"),
                })
        })
        .collect()
}

/// Key of `entity` as text, using the type's key selector.
pub fn key_of(controller: &Controller, entity_name: &str, entity: &Value) -> Option<String> {
    controller
        .definitions()
        .get_definition(entity_name)
        .ok()?
        .select_id(entity)
        .map(|key| key.to_string())
}

/// Print a status line for a completion.
pub fn status(global: &GlobalOpts, done: &EntityOperation, detail: &str) {
    output::print_status(
        &done.type_label(),
        detail,
        output::should_color(global.color),
        global.quiet,
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn query_params_split_on_first_equals() {
        let params = vec!["name=a=b".to_owned(), " power =wind".to_owned()];
        assert_eq!(
            parse_query_params(&params).unwrap(),
            vec![
                ("name".to_owned(), "a=b".to_owned()),
                ("power".to_owned(), "wind".to_owned()),
            ]
        );
    }

    #[test]
    fn query_params_require_name() {
        assert!(parse_query_params(&["=x".to_owned()]).is_err());
        assert!(parse_query_params(&["novalue".to_owned()]).is_err());
    }

    #[test]
    fn json_arg_must_be_object() {
        assert!(parse_json_arg("{\"name\":\"A\"}").is_ok());
        assert!(matches!(parse_json_arg("[1]"), Err(CliError::Validation { .. })));
        assert!(matches!(parse_json_arg("{oops"), Err(CliError::Json(_))));
    }

    #[test]
    fn json_arg_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.json");
        std::fs::write(&path, "{\"name\":\"B\"}").unwrap();
        let value = parse_json_arg(&format!("@{}", path.display())).unwrap();
        assert_eq!(value["name"], "B");
    }
}
