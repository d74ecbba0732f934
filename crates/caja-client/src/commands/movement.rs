use std::path::Path;

use crate::commands::common::{load_setup, open_reader, open_writer, parse_choice};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{
    MovementData, MovementDeleteData, MovementListData, MovementListFilters,
};
use crate::ledger::date::{build_range, format_iso_date, parse_iso_date_strict, today};
use crate::ledger::normalize::normalize_records;
use crate::ledger::types::{Currency, FinancialMovement, MovementKind, PaymentMethod};
use crate::store::movements::{self, DateField, ListQuery, SortField, StatusFilter};
use crate::store::validate::{apply_patch, validate_new};
use crate::store::{SOURCE_MANUAL, new_movement_id, now_timestamp};
use crate::{ClientError, ClientResult};

pub use crate::store::validate::{MovementInput, MovementPatch};

const DEFAULT_PER_PAGE: i64 = 50;
const MAX_PER_PAGE: i64 = 500;

#[derive(Debug, Default)]
pub struct MovementCreateOptions<'a> {
    pub input: MovementInput,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct MovementListOptions<'a> {
    pub status: Option<String>,
    pub kind: Option<String>,
    pub currency: Option<String>,
    pub payment_method: Option<String>,
    pub category: Option<String>,
    pub date_field: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub sort: Option<String>,
    pub descending: bool,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct MovementEditOptions<'a> {
    pub patch: MovementPatch,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct MovementSettleOptions<'a> {
    pub on: Option<String>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct MovementDeleteOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn create(input: MovementInput) -> ClientResult<SuccessEnvelope> {
    create_with_options(MovementCreateOptions {
        input,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn create_with_options(options: MovementCreateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let movement = validate_new(new_movement_id(), &options.input)?;
    let setup = load_setup(options.home_override)?;
    let (connection, db_path) = open_writer(&setup)?;
    movements::insert(
        &connection,
        &db_path,
        &movement,
        SOURCE_MANUAL,
        &now_timestamp(),
    )?;

    success("movement create", movement_data("created", movement))
}

pub fn list(options: MovementListOptions<'_>) -> ClientResult<SuccessEnvelope> {
    list_with_options(options)
}

#[doc(hidden)]
pub fn list_with_options(options: MovementListOptions<'_>) -> ClientResult<SuccessEnvelope> {
    const COMMAND: &str = "movement list";

    let status = parse_choice(
        options.status.as_deref(),
        "status",
        "all|pending|settled",
        COMMAND,
        StatusFilter::parse,
    )?
    .unwrap_or(StatusFilter::All);
    let kind = parse_choice(
        options.kind.as_deref(),
        "kind",
        "inflow|outflow",
        COMMAND,
        MovementKind::parse,
    )?;
    let currency = parse_choice(
        options.currency.as_deref(),
        "currency",
        "local|foreign",
        COMMAND,
        Currency::parse,
    )?;
    let payment_method = parse_choice(
        options.payment_method.as_deref(),
        "payment_method",
        "cash|wire_transfer|other",
        COMMAND,
        PaymentMethod::parse,
    )?;
    let date_field = parse_choice(
        options.date_field.as_deref(),
        "date_field",
        "expected|effective",
        COMMAND,
        DateField::parse,
    )?
    .unwrap_or(DateField::Expected);
    let sort = parse_choice(
        options.sort.as_deref(),
        "sort",
        "expected_date|effective_date|amount|created_at",
        COMMAND,
        SortField::parse,
    )?
    .unwrap_or(SortField::ExpectedDate);
    let (from, to) = build_range(options.from.as_deref(), options.to.as_deref(), COMMAND)?;
    let page = options.page.unwrap_or(1);
    let per_page = options.per_page.unwrap_or(DEFAULT_PER_PAGE);
    if page < 1 || !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(ClientError::invalid_argument_for_command(
            &format!("`page` must be >= 1 and `per_page` between 1 and {MAX_PER_PAGE}."),
            Some(COMMAND),
        ));
    }
    let category = options
        .category
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let query = ListQuery {
        status,
        kind,
        currency,
        payment_method,
        category: category.clone(),
        date_field,
        from,
        to,
        sort,
        descending: options.descending,
        page,
        per_page,
    };

    let setup = load_setup(options.home_override)?;
    let (connection, db_path) = open_reader(&setup)?;
    let (total, raw_rows) = movements::list(&connection, &db_path, &query)?;
    let batch = normalize_records(&raw_rows);

    let filters = MovementListFilters {
        status: status.as_str().to_string(),
        kind: kind.map(|value| value.as_str().to_string()),
        currency: currency.map(|value| value.as_str().to_string()),
        payment_method: payment_method.map(|value| value.as_str().to_string()),
        category,
        date_field: date_field.as_str().to_string(),
        from: from.as_ref().map(format_iso_date),
        to: to.as_ref().map(format_iso_date),
        sort: sort.as_str().to_string(),
        direction: if options.descending { "desc" } else { "asc" }.to_string(),
    };

    success(
        COMMAND,
        MovementListData {
            filters,
            page,
            per_page,
            total,
            returned: batch.movements.len() as i64,
            movements: batch.movements,
            diagnostics: batch.diagnostics,
        },
    )
}

pub fn edit(movement_id: &str, patch: MovementPatch) -> ClientResult<SuccessEnvelope> {
    edit_with_options(
        movement_id,
        MovementEditOptions {
            patch,
            home_override: None,
        },
    )
}

#[doc(hidden)]
pub fn edit_with_options(
    movement_id: &str,
    options: MovementEditOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    if options.patch.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Nothing to change: pass at least one field flag.",
            Some("movement edit"),
        ));
    }

    let setup = load_setup(options.home_override)?;
    let (connection, db_path) = open_writer(&setup)?;
    let existing = movements::get(&connection, &db_path, movement_id)?
        .ok_or_else(|| ClientError::movement_not_found(movement_id))?;
    let updated = apply_patch(&existing, &options.patch)?;
    movements::update(&connection, &db_path, &updated, &now_timestamp())?;

    success("movement edit", movement_data("updated", updated))
}

pub fn settle(movement_id: &str, on: Option<String>) -> ClientResult<SuccessEnvelope> {
    settle_with_options(
        movement_id,
        MovementSettleOptions {
            on,
            home_override: None,
        },
    )
}

/// Marks a pending movement as settled on `on` (today by default).
#[doc(hidden)]
pub fn settle_with_options(
    movement_id: &str,
    options: MovementSettleOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    let effective_date = match options.on.as_deref() {
        Some(value) => parse_iso_date_strict(value, "on", "movement settle")?,
        None => today(),
    };

    let setup = load_setup(options.home_override)?;
    let (connection, db_path) = open_writer(&setup)?;
    let mut movement = movements::get(&connection, &db_path, movement_id)?
        .ok_or_else(|| ClientError::movement_not_found(movement_id))?;
    if let Some(settled_on) = movement.effective_date {
        return Err(ClientError::movement_already_settled(
            movement_id,
            &format_iso_date(&settled_on),
        ));
    }

    movement.effective_date = Some(effective_date);
    movements::update(&connection, &db_path, &movement, &now_timestamp())?;

    success("movement settle", movement_data("settled", movement))
}

pub fn delete(movement_id: &str) -> ClientResult<SuccessEnvelope> {
    delete_with_options(
        movement_id,
        MovementDeleteOptions {
            home_override: None,
        },
    )
}

#[doc(hidden)]
pub fn delete_with_options(
    movement_id: &str,
    options: MovementDeleteOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let (connection, db_path) = open_writer(&setup)?;
    if !movements::delete(&connection, &db_path, movement_id)? {
        return Err(ClientError::movement_not_found(movement_id));
    }

    success(
        "movement delete",
        MovementDeleteData {
            movement_id: movement_id.to_string(),
            deleted: true,
        },
    )
}

fn movement_data(action: &str, movement: FinancialMovement) -> MovementData {
    let status = if movement.is_pending() {
        "pending"
    } else {
        "settled"
    };
    MovementData {
        action: action.to_string(),
        status: status.to_string(),
        movement,
    }
}
