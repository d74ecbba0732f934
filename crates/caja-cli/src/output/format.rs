use std::cmp;

use caja_client::ledger::money::{NOT_AVAILABLE, format_currency_text, format_display_date};
use caja_client::ledger::types::Currency;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub name: &'a str,
    pub align: Align,
}

const INDENT: usize = 2;
const COLUMN_GAP: usize = 2;
const MIN_TABLE_COLUMN_WIDTH: usize = 8;

pub fn terminal_width() -> usize {
    let from_env = std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(120);
    cmp::max(from_env, 40)
}

pub fn key_value_rows(entries: &[(&str, String)], indent: usize) -> Vec<String> {
    if entries.is_empty() {
        return Vec::new();
    }

    let label_width = entries
        .iter()
        .map(|(label, _)| display_width(label))
        .max()
        .unwrap_or(0);
    let padding = " ".repeat(indent);

    entries
        .iter()
        .map(|(label, value)| format!("{padding}{label:<label_width$}  {value}"))
        .collect()
}

pub fn render_table_or_blocks(
    columns: &[Column<'_>],
    rows: &[Vec<String>],
    max_width: usize,
    block_label: &str,
) -> Vec<String> {
    if columns.is_empty() {
        return Vec::new();
    }

    if should_fallback_to_blocks(columns.len(), max_width) {
        return render_blocks(columns, rows, block_label);
    }

    let natural = natural_column_widths(columns, rows);
    // Right-aligned columns hold amounts, which must never wrap.
    let minimums = columns
        .iter()
        .zip(&natural)
        .map(|(column, natural_width)| match column.align {
            Align::Right => *natural_width,
            Align::Left => cmp::min(
                *natural_width,
                cmp::max(display_width(column.name), MIN_TABLE_COLUMN_WIDTH),
            ),
        })
        .collect::<Vec<usize>>();
    let available = max_width.saturating_sub(INDENT);
    let gap_total = COLUMN_GAP * columns.len().saturating_sub(1);
    let budget = available.saturating_sub(gap_total);

    let Some(widths) = fit_widths_to_budget(&natural, &minimums, budget) else {
        return render_blocks(columns, rows, block_label);
    };

    let header = columns
        .iter()
        .map(|column| column.name.to_string())
        .collect::<Vec<_>>();
    let mut output = vec![format_row(columns, &header, &widths)];

    for row in rows {
        let wrapped = wrap_row(row, &widths);
        let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);
        for line in 0..height {
            let cells = wrapped
                .iter()
                .map(|chunks| chunks.get(line).cloned().unwrap_or_default())
                .collect::<Vec<_>>();
            output.push(format_row(columns, &cells, &widths));
        }
    }

    output
}

fn should_fallback_to_blocks(column_count: usize, max_width: usize) -> bool {
    let minimum = INDENT
        + (MIN_TABLE_COLUMN_WIDTH * column_count)
        + (COLUMN_GAP * column_count.saturating_sub(1));
    max_width < minimum
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}

fn natural_column_widths(columns: &[Column<'_>], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths = columns
        .iter()
        .map(|column| display_width(column.name))
        .collect::<Vec<usize>>();

    for row in rows {
        for (slot, value) in widths.iter_mut().zip(row) {
            *slot = cmp::max(*slot, display_width(value));
        }
    }

    widths
}

/// Narrows the widest column that is still above its minimum, one character
/// at a time, until the row fits.
fn fit_widths_to_budget(
    natural: &[usize],
    minimums: &[usize],
    budget: usize,
) -> Option<Vec<usize>> {
    if natural.len() != minimums.len() || minimums.iter().sum::<usize>() > budget {
        return None;
    }

    let mut widths = natural.to_vec();
    let mut total = widths.iter().sum::<usize>();
    while total > budget {
        let widest = widths
            .iter()
            .zip(minimums)
            .enumerate()
            .filter(|(_, (width, floor))| width > floor)
            .max_by_key(|(_, (width, _))| **width)
            .map(|(index, _)| index)?;
        widths[widest] -= 1;
        total -= 1;
    }

    Some(widths)
}

fn wrap_row(row: &[String], widths: &[usize]) -> Vec<Vec<String>> {
    widths
        .iter()
        .enumerate()
        .map(|(index, width)| {
            let value = row.get(index).map(String::as_str).unwrap_or("");
            wrap_text(value, *width)
        })
        .collect()
}

fn format_row(columns: &[Column<'_>], cells: &[String], widths: &[usize]) -> String {
    let pieces = columns
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(index, (column, &width))| {
            let value = cells.get(index).map(String::as_str).unwrap_or("");
            match column.align {
                Align::Left => format!("{value:<width$}"),
                Align::Right => format!("{value:>width$}"),
            }
        })
        .collect::<Vec<_>>();

    let line = format!("{}{}", " ".repeat(INDENT), pieces.join(&" ".repeat(COLUMN_GAP)));
    line.trim_end().to_string()
}

fn wrap_text(value: &str, width: usize) -> Vec<String> {
    if width == 0 || display_width(value) <= width {
        return vec![value.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in value.split_whitespace() {
        if !current.is_empty() {
            if display_width(&current) + 1 + display_width(word) <= width {
                current.push(' ');
                current.push_str(word);
                continue;
            }
            lines.push(std::mem::take(&mut current));
        }

        if display_width(word) <= width {
            current.push_str(word);
        } else {
            let mut chunks = split_long_token(word, width);
            // the last chunk can still take the next word
            current = chunks.pop().unwrap_or_default();
            lines.extend(chunks);
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_long_token(token: &str, width: usize) -> Vec<String> {
    let chars = token.chars().collect::<Vec<char>>();
    chars
        .chunks(width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn render_blocks(columns: &[Column<'_>], rows: &[Vec<String>], block_label: &str) -> Vec<String> {
    if rows.is_empty() {
        return Vec::new();
    }

    let labels = columns
        .iter()
        .map(|column| format!("{}:", column.name))
        .collect::<Vec<String>>();
    let label_width = labels
        .iter()
        .map(|label| display_width(label))
        .max()
        .unwrap_or(0);

    let mut output = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        output.push(format!("  {block_label} {}:", row_index + 1));

        for (column_index, label) in labels.iter().enumerate() {
            let value = row.get(column_index).cloned().unwrap_or_default();
            output.push(format!("    {label:<label_width$}  {value}"));
        }

        if row_index + 1 < rows.len() {
            output.push(String::new());
        }
    }

    output
}

/// Money cell for a decimal serialized as a JSON string.
pub fn amount_cell(value: Option<&Value>, currency: Currency) -> String {
    match value.and_then(Value::as_str) {
        Some(raw) => format_currency_text(raw, currency),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn date_cell(value: Option<&Value>) -> String {
    format_display_date(value.and_then(Value::as_str))
}

pub fn text_cell(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .unwrap_or("-")
        .to_string()
}

/// Excluded records first, then warnings on records that were kept.
pub fn diagnostic_lines(diagnostics: &[Value]) -> Vec<String> {
    let (excluded, warnings): (Vec<&Value>, Vec<&Value>) = diagnostics
        .iter()
        .partition(|item| item.get("excluded").and_then(Value::as_bool) == Some(true));

    let mut lines = Vec::new();
    if !excluded.is_empty() {
        lines.push(format!("Excluded records ({}):", excluded.len()));
        lines.extend(excluded.iter().map(|item| diagnostic_line(item)));
    }
    if !warnings.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("Warnings ({}):", warnings.len()));
        lines.extend(warnings.iter().map(|item| diagnostic_line(item)));
    }
    lines
}

fn diagnostic_line(item: &Value) -> String {
    let record = item.get("record").and_then(Value::as_u64).unwrap_or(0);
    let id = item
        .get("id")
        .and_then(Value::as_str)
        .map(|value| format!(" ({value})"))
        .unwrap_or_default();
    let message = item.get("message").and_then(Value::as_str).unwrap_or("");
    format!("  - record {record}{id}: {message}")
}
