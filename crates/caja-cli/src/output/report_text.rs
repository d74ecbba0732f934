use std::io;

use caja_client::ledger::types::Currency;
use serde_json::Value;

use super::format::{self, Align, Column};

const METHOD_ROWS: [(&str, &str); 4] = [
    ("cash", "Cash"),
    ("wire_transfer", "Wire transfer"),
    ("other", "Other"),
    ("total", "Total"),
];

pub fn render_summary(data: &Value) -> io::Result<String> {
    let summary = data
        .get("summary")
        .ok_or_else(|| io::Error::other("summary output requires summary"))?;

    let mut lines = vec![
        format!("Summary as of {}", format::date_cell(data.get("as_of"))),
        period_line(data),
        rate_line(data),
    ];
    lines.extend(render_sections(summary, data));
    Ok(lines.join("\n"))
}

pub fn render_report(data: &Value) -> io::Result<String> {
    let summary = data
        .get("summary")
        .ok_or_else(|| io::Error::other("report output requires summary"))?;

    let title = match data.get("report").and_then(Value::as_str) {
        Some("daily") => format!("Daily report for {}", format::date_cell(data.get("as_of"))),
        _ => format!(
            "Monthly report closing {}",
            format::date_cell(data.get("as_of"))
        ),
    };
    let mut lines = vec![title, period_line(data), rate_line(data)];
    lines.extend(render_sections(summary, data));

    let categories = data
        .get("categories")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    lines.push(String::new());
    lines.push("By category (settled in period):".to_string());
    if categories.is_empty() {
        lines.push("  No settled movements in this period.".to_string());
    } else {
        let rows = categories
            .iter()
            .map(|item| {
                let totals = item.get("totals").cloned().unwrap_or(Value::Null);
                let mut row = vec![format::text_cell(item.get("category"))];
                row.extend(flow_cells(&totals));
                row
            })
            .collect::<Vec<_>>();
        lines.extend(format::render_table_or_blocks(
            &flow_columns("Category"),
            &rows,
            format::terminal_width(),
            "Category",
        ));
    }

    let pending = summary
        .get("pending_records")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if !pending.is_empty() {
        lines.push(String::new());
        lines.push("Pending movements:".to_string());
        lines.extend(pending.iter().map(|movement| {
            let currency = currency_of(movement);
            format!(
                "  - {}  {}  {}  {}",
                format::date_cell(movement.get("expected_date")),
                format::text_cell(movement.get("kind")),
                format::amount_cell(movement.get("amount"), currency),
                format::text_cell(movement.get("id")),
            )
        }));
    }

    Ok(lines.join("\n"))
}

fn render_sections(summary: &Value, data: &Value) -> Vec<String> {
    let mut lines = vec![String::new(), "Period totals (settled):".to_string()];
    let period_totals = summary.get("period_totals").cloned().unwrap_or(Value::Null);
    let period_rows = METHOD_ROWS
        .iter()
        .map(|(key, label)| {
            let mut row = vec![(*label).to_string()];
            row.extend(flow_cells(period_totals.get(*key).unwrap_or(&Value::Null)));
            row
        })
        .collect::<Vec<_>>();
    lines.extend(format::render_table_or_blocks(
        &flow_columns("Method"),
        &period_rows,
        format::terminal_width(),
        "Method",
    ));

    lines.push(String::new());
    lines.push("Balance:".to_string());
    let balance = summary
        .get("cumulative_balance")
        .cloned()
        .unwrap_or(Value::Null);
    let balance_rows = METHOD_ROWS
        .iter()
        .map(|(key, label)| {
            let bucket = balance.get(*key).unwrap_or(&Value::Null);
            vec![
                (*label).to_string(),
                format::amount_cell(bucket.get("local"), Currency::Local),
                format::amount_cell(bucket.get("foreign"), Currency::Foreign),
            ]
        })
        .collect::<Vec<_>>();
    lines.extend(format::render_table_or_blocks(
        &[
            Column {
                name: "Method",
                align: Align::Left,
            },
            Column {
                name: "Local",
                align: Align::Right,
            },
            Column {
                name: "Foreign",
                align: Align::Right,
            },
        ],
        &balance_rows,
        format::terminal_width(),
        "Method",
    ));

    lines.push(String::new());
    lines.extend(render_pending(summary, data));

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
    lines
}

fn render_pending(summary: &Value, data: &Value) -> Vec<String> {
    let pending = summary.get("pending_totals").cloned().unwrap_or(Value::Null);
    let count = pending.get("count").and_then(Value::as_u64).unwrap_or(0);
    let inflow = pending.get("inflow").cloned().unwrap_or(Value::Null);
    let outflow = pending.get("outflow").cloned().unwrap_or(Value::Null);
    let equivalent = pending
        .get("local_equivalent")
        .cloned()
        .unwrap_or(Value::Null);

    let mut net = format::amount_cell(equivalent.get("net"), Currency::Local);
    if data.get("rate_status").and_then(Value::as_str) == Some("unit_fallback") {
        net.push_str(" (approximate)");
    }

    let mut lines = vec![format!("Pending ({count}):")];
    lines.extend(format::key_value_rows(
        &[
            (
                "To collect:",
                format!(
                    "{}  {}",
                    format::amount_cell(inflow.get("local"), Currency::Local),
                    format::amount_cell(inflow.get("foreign"), Currency::Foreign)
                ),
            ),
            (
                "To pay:",
                format!(
                    "{}  {}",
                    format::amount_cell(outflow.get("local"), Currency::Local),
                    format::amount_cell(outflow.get("foreign"), Currency::Foreign)
                ),
            ),
            ("Net in local:", net),
        ],
        2,
    ));
    lines
}

fn period_line(data: &Value) -> String {
    let period = data.get("period").cloned().unwrap_or(Value::Null);
    format!(
        "Period: {} - {}",
        format::date_cell(period.get("start")),
        format::date_cell(period.get("end"))
    )
}

fn rate_line(data: &Value) -> String {
    match data.get("exchange_rate") {
        Some(rate) if rate.is_object() => {
            let origin = rate.get("origin").and_then(Value::as_str).unwrap_or("stored");
            format!(
                "Exchange rate: buy {} / sell {} ({origin})",
                format::amount_cell(rate.get("buy"), Currency::Local),
                format::amount_cell(rate.get("sell"), Currency::Local)
            )
        }
        _ => "Exchange rate: not set, foreign amounts counted one-to-one (approximate)".to_string(),
    }
}

fn flow_columns(first: &'static str) -> [Column<'static>; 5] {
    [
        Column {
            name: first,
            align: Align::Left,
        },
        Column {
            name: "In local",
            align: Align::Right,
        },
        Column {
            name: "Out local",
            align: Align::Right,
        },
        Column {
            name: "In foreign",
            align: Align::Right,
        },
        Column {
            name: "Out foreign",
            align: Align::Right,
        },
    ]
}

fn flow_cells(by_currency: &Value) -> Vec<String> {
    let local = by_currency.get("local").cloned().unwrap_or(Value::Null);
    let foreign = by_currency.get("foreign").cloned().unwrap_or(Value::Null);
    vec![
        format::amount_cell(local.get("inflow"), Currency::Local),
        format::amount_cell(local.get("outflow"), Currency::Local),
        format::amount_cell(foreign.get("inflow"), Currency::Foreign),
        format::amount_cell(foreign.get("outflow"), Currency::Foreign),
    ]
}

fn currency_of(movement: &Value) -> Currency {
    movement
        .get("currency")
        .and_then(Value::as_str)
        .and_then(Currency::parse)
        .unwrap_or(Currency::Local)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{render_report, render_summary};

    fn flows(local_in: &str, local_out: &str) -> Value {
        json!({
            "local": {"inflow": local_in, "outflow": local_out},
            "foreign": {"inflow": "0", "outflow": "0"}
        })
    }

    fn summary_payload(rate: Value, rate_status: &str) -> Value {
        json!({
            "as_of": "2024-01-31",
            "period": {"start": "2024-01-01", "end": "2024-01-31"},
            "exchange_rate": rate,
            "rate_status": rate_status,
            "summary": {
                "period_totals": {
                    "cash": flows("1000", "400"),
                    "wire_transfer": flows("0", "0"),
                    "other": flows("0", "0"),
                    "total": flows("1000", "400")
                },
                "cumulative_balance": {
                    "cash": {"local": "600", "foreign": "0"},
                    "wire_transfer": {"local": "0", "foreign": "0"},
                    "other": {"local": "0", "foreign": "0"},
                    "total": {"local": "600", "foreign": "0"}
                },
                "pending_totals": {
                    "inflow": {"local": "0", "foreign": "50"},
                    "outflow": {"local": "0", "foreign": "0"},
                    "count": 1,
                    "local_equivalent": {"inflow": "50", "outflow": "0", "net": "50", "rate_status": rate_status}
                },
                "settled_records": [],
                "pending_records": [
                    {"id": "m3", "kind": "inflow", "currency": "foreign", "amount": "50", "expected_date": "2024-01-20"}
                ]
            },
            "records_read": 3,
            "records_excluded": 0,
            "diagnostics": []
        })
    }

    #[test]
    fn summary_marks_unit_fallback_as_approximate() {
        let rendered = render_summary(&summary_payload(Value::Null, "unit_fallback"));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("Summary as of 31/01/2024"));
            assert!(text.contains("Period: 01/01/2024 - 31/01/2024"));
            assert!(text.contains("not set"));
            assert!(text.contains("$ 600,00"));
            assert!(text.contains("US$ 50,00"));
            assert!(text.contains("$ 50,00 (approximate)"));
        }
    }

    #[test]
    fn summary_shows_applied_rate() {
        let rendered = render_summary(&summary_payload(
            json!({"buy": "1000", "sell": "1100", "origin": "override"}),
            "applied",
        ));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("buy $ 1.000,00 / sell $ 1.100,00 (override)"));
            assert!(!text.contains("approximate"));
        }
    }

    #[test]
    fn monthly_report_lists_categories_and_pending() {
        let mut payload = summary_payload(Value::Null, "unit_fallback");
        if let Some(object) = payload.as_object_mut() {
            object.insert("report".to_string(), json!("monthly"));
            object.insert(
                "categories".to_string(),
                json!([{"category": "Eventos", "totals": flows("1000", "0")}]),
            );
        }
        let rendered = render_report(&payload);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("Monthly report closing 31/01/2024"));
            assert!(text.contains("By category (settled in period):"));
            assert!(text.contains("Eventos"));
            assert!(text.contains("Pending movements:"));
            assert!(text.contains("20/01/2024  inflow  US$ 50,00  m3"));
        }
    }

    #[test]
    fn report_without_summary_is_an_error() {
        assert!(render_report(&json!({"report": "daily"})).is_err());
    }
}
