//! Output formatting: table, JSON, plain.
//!
//! Entities are free-form JSON objects, so tables are built column by
//! column from the fields actually present rather than from a derive.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Whether status lines on stderr should be colored.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// One-line summary of a completed operation, written to stderr.
pub fn print_status(label: &str, detail: &str, color: bool, quiet: bool) {
    if quiet {
        return;
    }
    let mut stderr = io::stderr().lock();
    if color {
        let _ = writeln!(stderr, "{} {} {}", "✓".green(), label.bold(), detail.dimmed());
    } else {
        let _ = writeln!(stderr, "✓ {label} {detail}");
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render entities in the chosen format. `key_of` feeds plain output.
pub fn render_entities<'a>(
    format: OutputFormat,
    entities: &'a [Value],
    key_of: impl Fn(&'a Value) -> Option<String>,
) -> String {
    match format {
        OutputFormat::Table => render_entity_table(entities),
        OutputFormat::Json => render_json(entities, false),
        OutputFormat::JsonCompact => render_json(entities, true),
        OutputFormat::Plain => entities.iter().filter_map(key_of).collect::<Vec<_>>().join("\n"),
    }
}

/// Render one entity; tables show it as field/value rows.
pub fn render_entity(format: OutputFormat, entity: &Value, key: Option<String>) -> String {
    match format {
        OutputFormat::Table => render_detail(entity),
        OutputFormat::Json => render_json(entity, false),
        OutputFormat::JsonCompact => render_json(entity, true),
        OutputFormat::Plain => key.unwrap_or_default(),
    }
}

/// Render derive-based rows (used for static listings).
pub fn render_rows<R: Tabled, T: serde::Serialize>(
    format: OutputFormat,
    rows: &[R],
    data: &T,
    ids: &[String],
) -> String {
    match format {
        OutputFormat::Table => Table::new(rows).with(Style::rounded()).to_string(),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Plain => ids.join("\n"),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

/// Columns are the union of top-level fields in first-seen order.
fn render_entity_table(entities: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for entity in entities {
        if let Value::Object(fields) = entity {
            for name in fields.keys() {
                if !columns.contains(&name.as_str()) {
                    columns.push(name);
                }
            }
        }
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| (*c).to_owned()));
    for entity in entities {
        builder.push_record(columns.iter().map(|c| entity.get(*c).map(cell).unwrap_or_default()));
    }
    builder.build().with(Style::rounded()).to_string()
}

fn render_detail(entity: &Value) -> String {
    let mut builder = Builder::default();
    match entity {
        Value::Object(fields) => {
            for (name, value) in fields {
                builder.push_record([name.clone(), cell(value)]);
            }
        }
        other => builder.push_record([cell(other)]),
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Strings print bare; everything else as compact JSON.
fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_columns_are_union_of_fields() {
        let entities = vec![
            json!({ "id": 1, "name": "Windstorm" }),
            json!({ "id": 2, "power": "magnetism" }),
        ];
        let table = render_entities(OutputFormat::Table, &entities, |_| None);
        let header = table.lines().nth(1).unwrap_or_default();
        assert!(header.contains("id"));
        assert!(header.contains("name"));
        assert!(header.contains("power"));
        assert!(table.contains("Windstorm"));
    }

    #[test]
    fn plain_prints_keys() {
        let entities = vec![json!({ "id": 1 }), json!({ "id": "b" })];
        let plain = render_entities(OutputFormat::Plain, &entities, |e| {
            e.get("id").map(cell)
        });
        assert_eq!(plain, "1\nb");
    }

    #[test]
    fn cells_print_strings_bare() {
        assert_eq!(cell(&json!("x")), "x");
        assert_eq!(cell(&json!(3)), "3");
        assert_eq!(cell(&json!(null)), "");
        assert_eq!(cell(&json!({ "a": 1 })), "{\"a\":1}");
    }

    #[test]
    fn single_entity_json() {
        let out = render_entity(OutputFormat::JsonCompact, &json!({ "id": 1 }), None);
        assert_eq!(out, "{\"id\":1}");
    }
}
