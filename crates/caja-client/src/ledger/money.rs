use rust_decimal::{Decimal, RoundingStrategy};

use crate::ledger::date::parse_calendar_date;
use crate::ledger::normalize::parse_decimal;
use crate::ledger::types::Currency;

pub const NOT_AVAILABLE: &str = "N/A";

/// `es-AR` layout: `.` groups thousands, `,` separates cents.
pub fn format_currency(amount: Decimal, currency: Currency) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    rounded = rounded.abs();
    rounded.rescale(2);

    let plain = rounded.to_string();
    let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let symbol = match currency {
        Currency::Local => "$",
        Currency::Foreign => "US$",
    };
    let sign = if negative { "-" } else { "" };
    format!("{sign}{symbol} {},{cents}", group_thousands(whole))
}

/// Formats loosely typed input, returning `N/A` when it is not a number.
pub fn format_currency_text(raw: &str, currency: Currency) -> String {
    match parse_decimal(raw) {
        Some(amount) => format_currency(amount, currency),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_display_date(raw: Option<&str>) -> String {
    raw.and_then(parse_calendar_date)
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn group_thousands(digits: &str) -> String {
    let mut output = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, character) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            output.push('.');
        }
        output.push(character);
    }
    output
}
