use std::io;

use serde_json::{Map, Value};

use super::format;

pub fn render_import_run(data: &Value) -> io::Result<String> {
    let dry_run = data
        .get("dry_run")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let summary = data
        .get("summary")
        .and_then(Value::as_object)
        .ok_or_else(|| io::Error::other("import output requires summary"))?;

    let mut lines = Vec::new();
    if dry_run {
        lines.push("Dry-run validation completed.".to_string());
    } else {
        lines.push("Import completed.".to_string());
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    let source = format!(
        "{} ({})",
        data.get("source_used")
            .and_then(Value::as_str)
            .unwrap_or("unknown"),
        data.get("format").and_then(Value::as_str).unwrap_or("unknown")
    );
    let entries = [
        ("Source:", source),
        ("Records read:", get_i64(summary, "records_read").to_string()),
        ("Valid:", get_i64(summary, "records_valid").to_string()),
        ("Excluded:", get_i64(summary, "records_excluded").to_string()),
        ("Inserted:", get_i64(summary, "inserted").to_string()),
        (
            "Skipped (id exists):",
            get_i64(summary, "skipped_existing").to_string(),
        ),
    ];
    lines.extend(format::key_value_rows(&entries, 2));

    let diagnostics = data
        .get("diagnostics")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let diagnostic_lines = format::diagnostic_lines(&diagnostics);
    if !diagnostic_lines.is_empty() {
        lines.push(String::new());
        lines.extend(diagnostic_lines);
    }

    let skipped = render_skipped_ids(data);
    if !skipped.is_empty() {
        lines.push(String::new());
        lines.extend(skipped);
    }

    if !dry_run {
        lines.push(String::new());
        lines.extend(render_ledger_now(data));
    }

    lines.push(String::new());
    if let Some(message) = data.get("message").and_then(Value::as_str) {
        lines.push(message.to_string());
        lines.push(String::new());
    }
    lines.extend(render_next_actions(dry_run));

    Ok(lines.join("\n"))
}

fn render_skipped_ids(data: &Value) -> Vec<String> {
    const PREVIEW_LIMIT: usize = 10;

    let ids = data
        .get("skipped_ids")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if ids.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![format!("Skipped ids ({}):", ids.len())];
    lines.extend(
        ids.iter()
            .take(PREVIEW_LIMIT)
            .filter_map(Value::as_str)
            .map(|id| format!("  - {id}")),
    );
    if ids.len() > PREVIEW_LIMIT {
        lines.push(format!("  ... and {} more", ids.len() - PREVIEW_LIMIT));
    }
    lines
}

fn render_ledger_now(data: &Value) -> Vec<String> {
    let ledger = data.get("ledger").cloned().unwrap_or(Value::Null);
    let range = ledger.get("data_range").cloned().unwrap_or(Value::Null);
    let covers = format!(
        "{} - {}",
        format::date_cell(range.get("earliest")),
        format::date_cell(range.get("latest"))
    );
    let mut lines = vec!["Ledger now:".to_string()];
    lines.extend(format::key_value_rows(
        &[
            (
                "Movements:",
                ledger
                    .get("movement_count")
                    .and_then(Value::as_i64)
                    .unwrap_or(0)
                    .to_string(),
            ),
            ("Expected dates:", covers),
        ],
        2,
    ));
    lines
}

fn render_next_actions(dry_run: bool) -> Vec<String> {
    let mut lines = vec!["Next step:".to_string()];
    if dry_run {
        lines.push("  Write the valid records:".to_string());
        lines.push("  caja import <path>".to_string());
    } else {
        lines.push("  Review the current month:".to_string());
        lines.push("  caja summary".to_string());
    }
    lines
}

fn get_i64(map: &Map<String, Value>, key: &str) -> i64 {
    map.get(key).and_then(Value::as_i64).unwrap_or(0)
}
