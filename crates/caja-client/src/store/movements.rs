use std::path::Path;

use chrono::NaiveDate;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use serde_json::Value;

use crate::ledger::date::format_iso_date;
use crate::ledger::normalize::{RawMovement, normalize_records};
use crate::ledger::types::{Currency, FinancialMovement, MovementKind, PaymentMethod};
use crate::state::map_sqlite_error;
use crate::{ClientError, ClientResult};

const SELECT_COLUMNS: &str = "movement_id, kind, payment_method, currency, amount, expected_date,
    effective_date, category, subcategory, detail, client_ref, provider_ref, event_ref,
    team_member_ref";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusFilter {
    All,
    Pending,
    Settled,
}

impl StatusFilter {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "pending" => Some(Self::Pending),
            "settled" => Some(Self::Settled),
            _ => None,
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Settled => "settled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DateField {
    Expected,
    Effective,
}

impl DateField {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "expected" | "expected_date" => Some(Self::Expected),
            "effective" | "effective_date" => Some(Self::Effective),
            _ => None,
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Expected => "expected",
            Self::Effective => "effective",
        }
    }

    const fn column(self) -> &'static str {
        match self {
            Self::Expected => "expected_date",
            Self::Effective => "effective_date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortField {
    ExpectedDate,
    EffectiveDate,
    Amount,
    CreatedAt,
}

impl SortField {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "expected" | "expected_date" => Some(Self::ExpectedDate),
            "effective" | "effective_date" => Some(Self::EffectiveDate),
            "amount" => Some(Self::Amount),
            "created" | "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::ExpectedDate => "expected_date",
            Self::EffectiveDate => "effective_date",
            Self::Amount => "amount",
            Self::CreatedAt => "created_at",
        }
    }

    const fn order_expression(self) -> &'static str {
        match self {
            Self::ExpectedDate => "expected_date",
            Self::EffectiveDate => "effective_date",
            Self::Amount => "CAST(amount AS REAL)",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ListQuery {
    pub(crate) status: StatusFilter,
    pub(crate) kind: Option<MovementKind>,
    pub(crate) currency: Option<Currency>,
    pub(crate) payment_method: Option<PaymentMethod>,
    pub(crate) category: Option<String>,
    pub(crate) date_field: DateField,
    pub(crate) from: Option<NaiveDate>,
    pub(crate) to: Option<NaiveDate>,
    pub(crate) sort: SortField,
    pub(crate) descending: bool,
    pub(crate) page: i64,
    pub(crate) per_page: i64,
}

pub(crate) fn insert(
    connection: &Connection,
    db_path: &Path,
    movement: &FinancialMovement,
    source_kind: &str,
    timestamp: &str,
) -> ClientResult<()> {
    connection
        .execute(
            "INSERT INTO internal_movements (
                movement_id,
                kind,
                payment_method,
                currency,
                amount,
                expected_date,
                effective_date,
                category,
                subcategory,
                detail,
                client_ref,
                provider_ref,
                event_ref,
                team_member_ref,
                source_kind,
                created_at,
                updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)",
            params![
                &movement.id,
                movement.kind.as_str(),
                movement.payment_method.as_str(),
                movement.currency.as_str(),
                movement.amount.to_string(),
                movement.expected_date.as_ref().map(format_iso_date),
                movement.effective_date.as_ref().map(format_iso_date),
                &movement.category,
                &movement.subcategory,
                &movement.detail,
                &movement.client_ref,
                &movement.provider_ref,
                &movement.event_ref,
                &movement.team_member_ref,
                source_kind,
                timestamp
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    tracing::debug!(movement_id = %movement.id, source_kind, "inserted movement");
    Ok(())
}

pub(crate) fn exists(connection: &Connection, db_path: &Path, movement_id: &str) -> ClientResult<bool> {
    let found = connection
        .query_row(
            "SELECT 1 FROM internal_movements WHERE movement_id = ?1 LIMIT 1",
            [movement_id],
            |_row| Ok(true),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?
        .unwrap_or(false);
    Ok(found)
}

/// Loads one stored movement. Rows that no longer normalize are reported as
/// ledger corruption rather than silently skipped.
pub(crate) fn get(
    connection: &Connection,
    db_path: &Path,
    movement_id: &str,
) -> ClientResult<Option<FinancialMovement>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM internal_movements WHERE movement_id = ?1");
    let raw = connection
        .query_row(&sql, [movement_id], row_to_raw)
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let Some(raw_movement) = raw else {
        return Ok(None);
    };
    let batch = normalize_records(std::slice::from_ref(&raw_movement));
    match batch.movements.into_iter().next() {
        Some(movement) => Ok(Some(movement)),
        None => Err(ClientError::ledger_corrupt(db_path)),
    }
}

pub(crate) fn update(
    connection: &Connection,
    db_path: &Path,
    movement: &FinancialMovement,
    timestamp: &str,
) -> ClientResult<bool> {
    let changed = connection
        .execute(
            "UPDATE internal_movements SET
                kind = ?2,
                payment_method = ?3,
                currency = ?4,
                amount = ?5,
                expected_date = ?6,
                effective_date = ?7,
                category = ?8,
                subcategory = ?9,
                detail = ?10,
                client_ref = ?11,
                provider_ref = ?12,
                event_ref = ?13,
                team_member_ref = ?14,
                updated_at = ?15
             WHERE movement_id = ?1",
            params![
                &movement.id,
                movement.kind.as_str(),
                movement.payment_method.as_str(),
                movement.currency.as_str(),
                movement.amount.to_string(),
                movement.expected_date.as_ref().map(format_iso_date),
                movement.effective_date.as_ref().map(format_iso_date),
                &movement.category,
                &movement.subcategory,
                &movement.detail,
                &movement.client_ref,
                &movement.provider_ref,
                &movement.event_ref,
                &movement.team_member_ref,
                timestamp
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    tracing::debug!(movement_id = %movement.id, changed, "updated movement");
    Ok(changed > 0)
}

pub(crate) fn delete(connection: &Connection, db_path: &Path, movement_id: &str) -> ClientResult<bool> {
    let changed = connection
        .execute(
            "DELETE FROM internal_movements WHERE movement_id = ?1",
            [movement_id],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    tracing::debug!(movement_id, changed, "deleted movement");
    Ok(changed > 0)
}

/// Full read-side snapshot for aggregation, in stable id order.
pub(crate) fn snapshot(connection: &Connection, db_path: &Path) -> ClientResult<Vec<RawMovement>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM internal_movements ORDER BY movement_id");
    query_raw(connection, db_path, &sql, Vec::new())
}

/// Returns the total matching count and the requested page.
pub(crate) fn list(
    connection: &Connection,
    db_path: &Path,
    query: &ListQuery,
) -> ClientResult<(i64, Vec<RawMovement>)> {
    let (where_clause, mut values) = build_filter(query);

    let count_sql = format!("SELECT COUNT(*) FROM internal_movements{where_clause}");
    let total = connection
        .query_row(&count_sql, params_from_iter(values.iter()), |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let direction = if query.descending { "DESC" } else { "ASC" };
    let page_sql = format!(
        "SELECT {SELECT_COLUMNS} FROM internal_movements{where_clause}
         ORDER BY {order} IS NULL, {order} {direction}, movement_id {direction}
         LIMIT ? OFFSET ?",
        order = query.sort.order_expression(),
    );
    values.push(SqlValue::Integer(query.per_page));
    values.push(SqlValue::Integer((query.page - 1) * query.per_page));

    let rows = query_raw(connection, db_path, &page_sql, values)?;
    Ok((total, rows))
}

fn build_filter(query: &ListQuery) -> (String, Vec<SqlValue>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<SqlValue> = Vec::new();

    match query.status {
        StatusFilter::All => {}
        StatusFilter::Pending => clauses.push("effective_date IS NULL".to_string()),
        StatusFilter::Settled => clauses.push("effective_date IS NOT NULL".to_string()),
    }
    if let Some(kind) = query.kind {
        clauses.push("kind = ?".to_string());
        values.push(SqlValue::Text(kind.as_str().to_string()));
    }
    if let Some(currency) = query.currency {
        clauses.push("currency = ?".to_string());
        values.push(SqlValue::Text(currency.as_str().to_string()));
    }
    if let Some(method) = query.payment_method {
        clauses.push("payment_method = ?".to_string());
        values.push(SqlValue::Text(method.as_str().to_string()));
    }
    if let Some(category) = &query.category {
        clauses.push("category = ?".to_string());
        values.push(SqlValue::Text(category.clone()));
    }
    let column = query.date_field.column();
    if let Some(from) = &query.from {
        clauses.push(format!("{column} >= ?"));
        values.push(SqlValue::Text(format_iso_date(from)));
    }
    if let Some(to) = &query.to {
        clauses.push(format!("{column} <= ?"));
        values.push(SqlValue::Text(format_iso_date(to)));
    }

    if clauses.is_empty() {
        return (String::new(), values);
    }
    (format!(" WHERE {}", clauses.join(" AND ")), values)
}

fn query_raw(
    connection: &Connection,
    db_path: &Path,
    sql: &str,
    values: Vec<SqlValue>,
) -> ClientResult<Vec<RawMovement>> {
    let mut statement = connection
        .prepare(sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let row_iter = statement
        .query_map(params_from_iter(values.iter()), row_to_raw)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in row_iter {
        rows.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(rows)
}

fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<RawMovement> {
    let text = |index: usize| -> rusqlite::Result<Option<Value>> {
        Ok(row.get::<_, Option<String>>(index)?.map(Value::String))
    };
    Ok(RawMovement {
        id: text(0)?,
        kind: text(1)?,
        payment_method: text(2)?,
        currency: text(3)?,
        amount: text(4)?,
        expected_date: text(5)?,
        effective_date: text(6)?,
        category: text(7)?,
        subcategory: text(8)?,
        detail: text(9)?,
        client_ref: text(10)?,
        provider_ref: text(11)?,
        event_ref: text(12)?,
        team_member_ref: text(13)?,
    })
}
