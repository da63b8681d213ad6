//! `entities`: list the entity types the config file describes.

use serde::Serialize;
use tabled::Tabled;

use stashly_config::Config;
use stashly_core::ResourcePaths;

use crate::cli::GlobalOpts;
use crate::output;

#[derive(Debug, Tabled, Serialize)]
struct EntityRow {
    #[tabled(rename = "Entity")]
    name: String,
    #[tabled(rename = "Key")]
    id_field: String,
    #[tabled(rename = "Entity Path")]
    entity_path: String,
    #[tabled(rename = "Collection Path")]
    collection_path: String,
    #[tabled(rename = "Sort")]
    sort_field: String,
    #[tabled(rename = "Filter")]
    filter_props: String,
}

fn rows(cfg: &Config) -> Vec<EntityRow> {
    cfg.entities
        .iter()
        .map(|(name, entity)| {
            let fallback = ResourcePaths::for_entity(name);
            EntityRow {
                name: name.clone(),
                id_field: entity.id_field.clone().unwrap_or_else(|| "id".into()),
                entity_path: entity.entity_path.clone().unwrap_or(fallback.entity),
                collection_path: entity.collection_path.clone().unwrap_or(fallback.collection),
                sort_field: entity.sort_field.clone().unwrap_or_default(),
                filter_props: entity.filter_props.join(","),
            }
        })
        .collect()
}

pub fn handle(cfg: &Config, global: &GlobalOpts) {
    let rows = rows(cfg);
    let names: Vec<String> = rows.iter().map(|r| r.name.clone()).collect();
    let rendered = output::render_rows(global.output, &rows, &rows, &names);
    output::print_output(&rendered, global.quiet);
}
