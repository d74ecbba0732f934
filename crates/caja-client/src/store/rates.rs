use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::ledger::normalize::parse_decimal;
use crate::ledger::rates::ExchangeRate;
use crate::state::map_sqlite_error;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredRate {
    pub(crate) rate: ExchangeRate,
    pub(crate) source: Option<String>,
    pub(crate) recorded_at: String,
}

pub(crate) fn insert(
    connection: &Connection,
    db_path: &Path,
    rate: &ExchangeRate,
    source: Option<&str>,
    timestamp: &str,
) -> ClientResult<()> {
    connection
        .execute(
            "INSERT INTO internal_exchange_rates (buy, sell, source, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![rate.buy.to_string(), rate.sell.to_string(), source, timestamp],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    tracing::debug!(buy = %rate.buy, sell = %rate.sell, "recorded exchange rate");
    Ok(())
}

pub(crate) fn latest(connection: &Connection, db_path: &Path) -> ClientResult<Option<StoredRate>> {
    let row = connection
        .query_row(
            "SELECT buy, sell, source, recorded_at FROM internal_exchange_rates
             ORDER BY recorded_at DESC, rate_id DESC LIMIT 1",
            [],
            read_row,
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    row.map(|columns| into_stored(columns, db_path)).transpose()
}

/// Most recent first.
pub(crate) fn history(
    connection: &Connection,
    db_path: &Path,
    limit: i64,
) -> ClientResult<Vec<StoredRate>> {
    let mut statement = connection
        .prepare(
            "SELECT buy, sell, source, recorded_at FROM internal_exchange_rates
             ORDER BY recorded_at DESC, rate_id DESC LIMIT ?1",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let row_iter = statement
        .query_map([limit], read_row)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rates = Vec::new();
    for row in row_iter {
        let columns = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        rates.push(into_stored(columns, db_path)?);
    }
    Ok(rates)
}

type RateColumns = (String, String, Option<String>, String);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RateColumns> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_stored(columns: RateColumns, db_path: &Path) -> ClientResult<StoredRate> {
    let (buy, sell, source, recorded_at) = columns;
    let rate = parse_decimal(&buy)
        .zip(parse_decimal(&sell))
        .and_then(|(buy_value, sell_value)| ExchangeRate::new(buy_value, sell_value))
        .ok_or_else(|| ClientError::ledger_corrupt(db_path))?;
    Ok(StoredRate {
        rate,
        source,
        recorded_at,
    })
}
