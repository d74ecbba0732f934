use serde_json::{Map, Value};

use crate::commands::common::{
    canonical_import_column, is_ignored_backend_column, optional_import_field_names,
    required_import_field_names,
};
use crate::store::{invalid_input_error, new_movement_id};
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SourceFormat {
    JsonArray,
    Csv,
}

impl SourceFormat {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::JsonArray => "json_array",
            Self::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedSource {
    pub(crate) format: SourceFormat,
    /// Always a JSON array of objects keyed by canonical or backend names.
    pub(crate) records: Value,
}

pub(crate) fn parse_source(content: &str) -> ClientResult<ParsedSource> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(invalid_input_error("Import source is empty."));
    }

    if looks_like_ndjson(trimmed) {
        return Err(ClientError::invalid_import_format(
            "NDJSON is not supported. Provide a JSON array or CSV.",
            "ndjson",
        ));
    }

    if trimmed.starts_with('[') {
        let records = serde_json::from_str::<Value>(trimmed)
            .map_err(|_| invalid_input_error("Invalid JSON input. Provide a valid JSON array."))?;
        return Ok(ParsedSource {
            format: SourceFormat::JsonArray,
            records,
        });
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        // PocketBase list responses wrap records in `items`.
        if let Some(items) = value.get("items").filter(|items| items.is_array()) {
            return Ok(ParsedSource {
                format: SourceFormat::JsonArray,
                records: items.clone(),
            });
        }
        return Err(ClientError::invalid_import_format(
            "JSON input must be a top-level array of movement objects.",
            "json_non_array",
        ));
    }

    if looks_like_csv(trimmed) {
        return Ok(ParsedSource {
            format: SourceFormat::Csv,
            records: parse_csv(trimmed)?,
        });
    }

    Err(ClientError::invalid_import_format(
        "Unsupported import format. Provide a JSON array or CSV with headers.",
        "unknown",
    ))
}

/// Imported records without an id get a fresh movement id so repeated
/// imports never collide on positional placeholders.
pub(crate) fn assign_missing_ids(records: &mut Value) {
    let Some(items) = records.as_array_mut() else {
        return;
    };
    for item in items {
        let Some(object) = item.as_object_mut() else {
            continue;
        };
        let has_id = match object.get("id") {
            Some(Value::String(text)) => !text.trim().is_empty(),
            Some(Value::Number(_)) => true,
            _ => false,
        };
        if !has_id {
            object.insert("id".to_string(), Value::String(new_movement_id()));
        }
    }
}

fn parse_csv(content: &str) -> ClientResult<Value> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|_| invalid_input_error("CSV header row is missing or unreadable."))?
        .iter()
        .map(|value| value.trim().to_string())
        .collect::<Vec<String>>();

    let Some(columns) = resolve_columns(&headers) else {
        return Err(ClientError::import_schema_mismatch(
            to_owned_names(required_import_field_names()),
            to_owned_names(optional_import_field_names()),
            headers,
        ));
    };

    let mut records = Vec::new();
    for result_row in reader.records() {
        let record =
            result_row.map_err(|_| invalid_input_error("CSV rows are malformed or not UTF-8."))?;

        let mut object = Map::new();
        for (index, column) in columns.iter().enumerate() {
            let Some(name) = column else {
                continue;
            };
            let value = match record.get(index).map(str::trim) {
                Some(text) if !text.is_empty() => Value::String(text.to_string()),
                _ => Value::Null,
            };
            object.insert((*name).to_string(), value);
        }
        records.push(Value::Object(object));
    }

    Ok(Value::Array(records))
}

/// Maps each header to its canonical field. `None` in the output marks an
/// ignored backend column. Returns `None` when headers are unknown,
/// duplicated or missing a required field.
fn resolve_columns(headers: &[String]) -> Option<Vec<Option<&'static str>>> {
    let mut columns: Vec<Option<&'static str>> = Vec::with_capacity(headers.len());
    for header in headers {
        if is_ignored_backend_column(header) {
            columns.push(None);
            continue;
        }
        let canonical = canonical_import_column(header)?;
        if columns.contains(&Some(canonical)) {
            return None;
        }
        columns.push(Some(canonical));
    }

    let has_required = required_import_field_names()
        .iter()
        .all(|required| columns.contains(&Some(*required)));
    has_required.then_some(columns)
}

fn to_owned_names(names: Vec<&'static str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}

fn looks_like_ndjson(content: &str) -> bool {
    let lines = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<&str>>();
    if lines.len() < 2 {
        return false;
    }

    lines.iter().all(|line| {
        serde_json::from_str::<Value>(line.trim())
            .map(|value| value.is_object())
            .unwrap_or(false)
    })
}

fn looks_like_csv(content: &str) -> bool {
    content
        .lines()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|first_line| first_line.contains(','))
}
