use std::io;

use caja_client::ledger::types::Currency;
use serde_json::Value;

use super::format::{self, Align, Column};

pub fn render_movement(data: &Value) -> io::Result<String> {
    let movement = data
        .get("movement")
        .ok_or_else(|| io::Error::other("movement output requires movement"))?;
    let action = data.get("action").and_then(Value::as_str).unwrap_or("saved");
    let status = data.get("status").and_then(Value::as_str).unwrap_or("pending");

    let mut lines = vec![format!("Movement {action}."), String::new()];
    let mut entries = vec![
        ("ID:", format::text_cell(movement.get("id"))),
        ("Status:", status.to_string()),
        ("Kind:", format::text_cell(movement.get("kind"))),
        ("Method:", format::text_cell(movement.get("payment_method"))),
        ("Amount:", movement_amount(movement)),
        ("Expected:", format::date_cell(movement.get("expected_date"))),
        ("Effective:", format::date_cell(movement.get("effective_date"))),
    ];
    for (label, key) in [
        ("Category:", "category"),
        ("Subcategory:", "subcategory"),
        ("Detail:", "detail"),
        ("Client:", "client_ref"),
        ("Provider:", "provider_ref"),
        ("Event:", "event_ref"),
        ("Team member:", "team_member_ref"),
    ] {
        if let Some(text) = movement.get(key).and_then(Value::as_str) {
            entries.push((label, text.to_string()));
        }
    }
    lines.extend(format::key_value_rows(&entries, 2));

    if status == "pending" && action != "settled" {
        lines.push(String::new());
        lines.push("Settle it once the money moves:".to_string());
        lines.push(format!(
            "  caja movement settle {} --on <YYYY-MM-DD>",
            format::text_cell(movement.get("id"))
        ));
    }

    Ok(lines.join("\n"))
}

pub fn render_movement_list(data: &Value) -> io::Result<String> {
    let rows = data
        .get("movements")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("movement list output requires movements"))?;
    let total = data.get("total").and_then(Value::as_i64).unwrap_or(0);

    if rows.is_empty() {
        return Ok([
            "No movements match these filters.",
            "",
            "Record one or import an export:",
            "  caja movement create --help",
            "  caja import --help",
        ]
        .join("\n"));
    }

    let page = data.get("page").and_then(Value::as_i64).unwrap_or(1);
    let per_page = data.get("per_page").and_then(Value::as_i64).unwrap_or(0);
    let mut lines = vec![
        format!(
            "{total} movement(s) found. Page {page}, showing {}.",
            rows.len()
        ),
        String::new(),
    ];

    let columns = [
        Column {
            name: "ID",
            align: Align::Left,
        },
        Column {
            name: "Kind",
            align: Align::Left,
        },
        Column {
            name: "Method",
            align: Align::Left,
        },
        Column {
            name: "Amount",
            align: Align::Right,
        },
        Column {
            name: "Expected",
            align: Align::Left,
        },
        Column {
            name: "Effective",
            align: Align::Left,
        },
        Column {
            name: "Category",
            align: Align::Left,
        },
    ];
    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                format::text_cell(row.get("id")),
                format::text_cell(row.get("kind")),
                format::text_cell(row.get("payment_method")),
                movement_amount(row),
                format::date_cell(row.get("expected_date")),
                effective_or_pending(row),
                format::text_cell(row.get("category")),
            ]
        })
        .collect::<Vec<_>>();
    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Movement",
    ));

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

    if page * per_page < total {
        lines.push(String::new());
        lines.push(format!("More results: rerun with --page {}.", page + 1));
    }

    Ok(lines.join("\n"))
}

pub fn render_movement_delete(data: &Value) -> io::Result<String> {
    let movement_id = data
        .get("movement_id")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("movement delete output requires movement_id"))?;
    Ok(format!("Movement {movement_id} deleted."))
}

fn movement_amount(movement: &Value) -> String {
    let currency = movement
        .get("currency")
        .and_then(Value::as_str)
        .and_then(Currency::parse)
        .unwrap_or(Currency::Local);
    let amount = format::amount_cell(movement.get("amount"), currency);
    match movement.get("kind").and_then(Value::as_str) {
        Some("outflow") => format!("-{amount}"),
        _ => amount,
    }
}

fn effective_or_pending(row: &Value) -> String {
    match row.get("effective_date") {
        Some(Value::String(_)) => format::date_cell(row.get("effective_date")),
        _ => "pending".to_string(),
    }
}
