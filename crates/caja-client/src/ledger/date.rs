use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::{ClientError, ClientResult};

/// Inclusive calendar-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self { start, end })
    }

    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn month_of(date: NaiveDate) -> Self {
        use chrono::Datelike;

        let start = date.with_day(1).unwrap_or(date);
        let last_day = days_in_month(date.year(), date.month());
        let end = date.with_day(last_day).unwrap_or(date);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Lenient parse used on stored and imported records. Accepts `YYYY-MM-DD`,
/// the backend's `YYYY-MM-DD HH:MM:SS.sssZ` and RFC 3339; keeps the day only.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.len() < 10 || !trimmed.is_char_boundary(10) {
        return None;
    }
    let (day_part, rest) = trimmed.split_at(10);
    if !looks_like_iso_date(day_part) {
        return None;
    }
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('T') {
        return None;
    }
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d").ok()
}

pub fn parse_iso_date_strict(value: &str, field_name: &str, command: &str) -> ClientResult<NaiveDate> {
    if !looks_like_iso_date(value) {
        return Err(ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with a real calendar date."),
            Some(command),
        ));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with valid calendar values."),
            Some(command),
        )
    })
}

/// Parses `YYYY-MM` into the month's full window.
pub fn parse_month(value: &str, command: &str) -> ClientResult<DateRange> {
    let invalid = || {
        ClientError::invalid_argument_for_command(
            "`month` must use YYYY-MM format with a real calendar month.",
            Some(command),
        )
    };
    let trimmed = value.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return Err(invalid());
    }
    let year = trimmed[..4].parse::<i32>().map_err(|_| invalid())?;
    let month = trimmed[5..7].parse::<u32>().map_err(|_| invalid())?;
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    Ok(DateRange::month_of(first))
}

pub fn build_range(
    from: Option<&str>,
    to: Option<&str>,
    command: &str,
) -> ClientResult<(Option<NaiveDate>, Option<NaiveDate>)> {
    let parsed_from = match from {
        Some(value) => Some(parse_iso_date_strict(value, "from", command)?),
        None => None,
    };
    let parsed_to = match to {
        Some(value) => Some(parse_iso_date_strict(value, "to", command)?),
        None => None,
    };

    if let (Some(start), Some(end)) = (parsed_from, parsed_to)
        && start > end
    {
        return Err(ClientError::invalid_argument_for_command(
            "Invalid date range: `from` must be on or before `to`.",
            Some(command),
        ));
    }

    Ok((parsed_from, parsed_to))
}

pub(crate) fn looks_like_iso_date(value: &str) -> bool {
    if value.len() != 10 {
        return false;
    }
    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return false;
        }
    }
    true
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
