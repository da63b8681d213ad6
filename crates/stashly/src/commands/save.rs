//! Save commands: add, update, delete.
//!
//! Optimism flags are only forwarded when given; otherwise the configured
//! dispatcher defaults apply.

use serde_json::Value;

use stashly_core::{Controller, EntityPayload};

use crate::cli::{AddArgs, DeleteArgs, GlobalOpts, UpdateArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn add(controller: &Controller, args: AddArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let entity = util::parse_json_arg(&args.json)?;
    let optimistic = args.optimistic.then_some(true);
    let done =
        util::run_to_completion(controller, &args.entity, |d| d.add(&entity, optimistic)).await?;

    let saved = match done.payload() {
        EntityPayload::Entity(saved) => saved.clone(),
        _ => entity,
    };
    let key = util::key_of(controller, &args.entity, &saved);
    util::status(global, &done, key.as_deref().unwrap_or_default());
    output::print_output(&output::render_entity(global.output, &saved, key), global.quiet);
    Ok(())
}

pub async fn update(
    controller: &Controller,
    args: UpdateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let partial = util::parse_json_arg(&args.json)?;
    let optimistic = args.pessimistic.then_some(false);
    let done =
        util::run_to_completion(controller, &args.entity, |d| d.update(&partial, optimistic)).await?;

    let (key, changes): (String, Value) = match done.payload() {
        EntityPayload::Update(update) => (update.id.to_string(), update.changes.clone()),
        _ => (String::new(), partial),
    };
    util::status(global, &done, &key);
    output::print_output(
        &output::render_entity(global.output, &changes, Some(key)),
        global.quiet,
    );
    Ok(())
}

pub async fn delete(
    controller: &Controller,
    args: DeleteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let optimistic = args.pessimistic.then_some(false);
    let key = args.key.clone();
    let done =
        util::run_to_completion(controller, &args.entity, |d| d.delete(key, optimistic)).await?;

    util::status(global, &done, &args.key.to_string());
    Ok(())
}
