use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::contracts::types::{LedgerContext, RateData};
use crate::ledger::normalize::{NormalizedBatch, normalize_records};
use crate::ledger::rates::ExchangeRate;
use crate::setup::{SetupContext, ensure_initialized_with_home_override};
use crate::state::{open_connection, open_readonly_connection};
use crate::store::{movements, rates, validate};
use crate::{ClientError, ClientResult};

const REQUIRED_IMPORT_FIELDS: [(&str, &[&str]); 4] = [
    ("kind", &["tipo", "type"]),
    ("payment_method", &["metodoPago", "paymentMethod"]),
    ("currency", &["moneda"]),
    ("amount", &["monto"]),
];

const OPTIONAL_IMPORT_FIELDS: [(&str, &[&str]); 10] = [
    ("id", &[]),
    ("expected_date", &["fechaEsperado", "expectedDate"]),
    ("effective_date", &["fechaEfectuado", "effectiveDate"]),
    ("category", &["categoria"]),
    ("subcategory", &["subcategoria"]),
    ("detail", &["detalle"]),
    ("client_ref", &["cliente", "client"]),
    ("provider_ref", &["proveedor", "provider"]),
    ("event_ref", &["evento", "event"]),
    ("team_member_ref", &["miembro", "teamMember"]),
];

/// Bookkeeping columns the hosted backend adds to every export.
const IGNORED_BACKEND_COLUMNS: [&str; 5] =
    ["collectionId", "collectionName", "created", "updated", "expand"];

pub(crate) fn required_import_field_names() -> Vec<&'static str> {
    REQUIRED_IMPORT_FIELDS
        .iter()
        .map(|(name, _)| *name)
        .collect()
}

pub(crate) fn optional_import_field_names() -> Vec<&'static str> {
    OPTIONAL_IMPORT_FIELDS
        .iter()
        .map(|(name, _)| *name)
        .collect()
}

pub(crate) fn canonical_import_column(header: &str) -> Option<&'static str> {
    REQUIRED_IMPORT_FIELDS
        .iter()
        .chain(OPTIONAL_IMPORT_FIELDS.iter())
        .find(|(name, aliases)| *name == header || aliases.contains(&header))
        .map(|(name, _)| *name)
}

pub(crate) fn is_ignored_backend_column(header: &str) -> bool {
    IGNORED_BACKEND_COLUMNS.contains(&header)
}

/// Per-command quote supplied on the command line instead of the stored one.
#[derive(Debug, Clone)]
pub struct RateInput {
    pub buy: String,
    pub sell: String,
}

pub(crate) fn load_setup(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(home_override)
}

pub(crate) fn ledger_context(setup: &SetupContext) -> LedgerContext {
    LedgerContext {
        db_path: setup.db_path.clone(),
        schema_version: setup.schema_version.clone(),
        movement_count: setup.movement_count,
        data_range: setup.data_range.clone(),
    }
}

pub(crate) fn open_writer(setup: &SetupContext) -> ClientResult<(Connection, PathBuf)> {
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;
    Ok((connection, db_path))
}

pub(crate) fn open_reader(setup: &SetupContext) -> ClientResult<(Connection, PathBuf)> {
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_readonly_connection(&db_path)?;
    Ok((connection, db_path))
}

/// Command-line quote first, then the latest stored quote, else none (the
/// aggregator then reports a unit fallback).
pub(crate) fn resolve_rate(
    connection: &Connection,
    db_path: &Path,
    rate_override: Option<&RateInput>,
) -> ClientResult<Option<(ExchangeRate, RateData)>> {
    if let Some(input) = rate_override {
        let rate = validate::validate_rate(&input.buy, &input.sell)?;
        return Ok(Some((
            rate,
            RateData {
                buy: rate.buy,
                sell: rate.sell,
                source: None,
                origin: "override".to_string(),
                recorded_at: None,
            },
        )));
    }

    let stored = rates::latest(connection, db_path)?;
    if stored.is_none() {
        tracing::info!("no exchange rate recorded; foreign amounts count one-to-one");
    }
    Ok(stored.map(|stored| (stored.rate, stored_rate_data(stored))))
}

/// Everything the read-side views aggregate over: the normalized movement
/// snapshot and the quote to value pending foreign amounts with.
pub(crate) struct LedgerSnapshot {
    pub(crate) batch: NormalizedBatch,
    pub(crate) rate: Option<ExchangeRate>,
    pub(crate) rate_data: Option<RateData>,
}

pub(crate) fn load_snapshot(
    setup: &SetupContext,
    rate_override: Option<&RateInput>,
) -> ClientResult<LedgerSnapshot> {
    let (connection, db_path) = open_reader(setup)?;
    let (rate, rate_data) = match resolve_rate(&connection, &db_path, rate_override)? {
        Some((rate, data)) => (Some(rate), Some(data)),
        None => (None, None),
    };
    let raw_rows = movements::snapshot(&connection, &db_path)?;
    Ok(LedgerSnapshot {
        batch: normalize_records(&raw_rows),
        rate,
        rate_data,
    })
}

pub(crate) fn stored_rate_data(stored: rates::StoredRate) -> RateData {
    RateData {
        buy: stored.rate.buy,
        sell: stored.rate.sell,
        source: stored.source,
        origin: "stored".to_string(),
        recorded_at: Some(stored.recorded_at),
    }
}

pub(crate) fn parse_choice<T>(
    value: Option<&str>,
    field_name: &str,
    accepted: &str,
    command: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> ClientResult<Option<T>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    parse(raw).map(Some).ok_or_else(|| {
        ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must be one of {accepted}; got `{raw}`."),
            Some(command),
        )
    })
}
