use std::io;

use caja_client::ledger::types::Currency;
use serde_json::Value;

use super::format::{self, Align, Column};

pub fn render_rate_set(data: &Value) -> io::Result<String> {
    if !data.is_object() {
        return Err(io::Error::other("rate set output requires a rate"));
    }
    let mut lines = vec!["Exchange rate recorded.".to_string(), String::new()];
    lines.extend(format::key_value_rows(&rate_entries(data), 2));
    lines.push(String::new());
    lines.push("Summaries and reports now value pending foreign amounts with this rate.".to_string());
    Ok(lines.join("\n"))
}

pub fn render_rate_show(data: &Value) -> io::Result<String> {
    let current = data
        .get("current")
        .ok_or_else(|| io::Error::other("rate show output requires current"))?;

    let mut lines = vec!["Current exchange rate:".to_string()];
    lines.extend(format::key_value_rows(&rate_entries(current), 2));

    let history = data
        .get("history")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if !history.is_empty() {
        lines.push(String::new());
        lines.push("Previous quotes:".to_string());
        let rows = history
            .iter()
            .map(|rate| {
                vec![
                    format::text_cell(rate.get("recorded_at")),
                    format::amount_cell(rate.get("buy"), Currency::Local),
                    format::amount_cell(rate.get("sell"), Currency::Local),
                    format::text_cell(rate.get("source")),
                ]
            })
            .collect::<Vec<_>>();
        lines.extend(format::render_table_or_blocks(
            &[
                Column {
                    name: "Recorded at",
                    align: Align::Left,
                },
                Column {
                    name: "Buy",
                    align: Align::Right,
                },
                Column {
                    name: "Sell",
                    align: Align::Right,
                },
                Column {
                    name: "Source",
                    align: Align::Left,
                },
            ],
            &rows,
            format::terminal_width(),
            "Quote",
        ));
    }

    Ok(lines.join("\n"))
}

fn rate_entries(rate: &Value) -> Vec<(&'static str, String)> {
    vec![
        ("Buy:", format::amount_cell(rate.get("buy"), Currency::Local)),
        ("Sell:", format::amount_cell(rate.get("sell"), Currency::Local)),
        ("Source:", format::text_cell(rate.get("source"))),
        ("Recorded at:", format::text_cell(rate.get("recorded_at"))),
    ]
}
