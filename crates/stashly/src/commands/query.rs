//! Read commands: get-all, get, query.

use serde_json::Value;

use stashly_core::{Controller, EntityDispatcher, EntityPayload, QueryParams};

use crate::cli::{GetAllArgs, GetArgs, GlobalOpts, QueryArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn get_all(
    controller: &Controller,
    args: GetAllArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let done = util::run_to_completion(controller, &args.entity, EntityDispatcher::get_all).await?;

    let selectors = controller.selectors(&args.entity)?;
    let entities = match args.filter {
        Some(pattern) => {
            controller.dispatcher(&args.entity)?.set_filter(pattern)?;
            selectors.filtered_entities()
        }
        None => selectors.entities(),
    };
    let entities: Vec<Value> = entities.iter().map(|e| e.as_ref().clone()).collect();

    util::status(global, &done, &format!("{} of {}", entities.len(), selectors.count()));
    print_entities(controller, &args.entity, &entities, global);
    Ok(())
}

pub async fn get(controller: &Controller, args: GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let key = args.key.clone();
    let done = util::run_to_completion(controller, &args.entity, |d| d.get_by_key(key)).await?;

    let EntityPayload::Entity(entity) = done.payload() else {
        return Err(CliError::NotFound {
            entity: args.entity,
            key: args.key.to_string(),
        });
    };

    util::status(global, &done, &args.key.to_string());
    let rendered = output::render_entity(global.output, entity, Some(args.key.to_string()));
    output::print_output(&rendered, global.quiet);
    Ok(())
}

pub async fn query(
    controller: &Controller,
    args: QueryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let params = QueryParams::from_pairs(util::parse_query_params(&args.params)?);
    let done =
        util::run_to_completion(controller, &args.entity, |d| d.get_with_query(params)).await?;

    let found: Vec<Value> = match done.payload() {
        EntityPayload::Entities(found) => found.clone(),
        _ => Vec::new(),
    };

    util::status(global, &done, &format!("{} matched", found.len()));
    print_entities(controller, &args.entity, &found, global);
    Ok(())
}

fn print_entities(controller: &Controller, entity_name: &str, entities: &[Value], global: &GlobalOpts) {
    let rendered = output::render_entities(global.output, entities, |e| {
        util::key_of(controller, entity_name, e)
    });
    output::print_output(&rendered, global.quiet);
}
