use std::path::Path;

use rusqlite::TransactionBehavior;

use crate::commands::common::{ledger_context, load_setup, open_writer};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{ImportData, ImportSummary};
use crate::ledger::normalize::normalize_json;
use crate::state::map_sqlite_error;
use crate::store::input::resolve_source;
use crate::store::parse::{assign_missing_ids, parse_source};
use crate::store::{SOURCE_IMPORT, movements, now_timestamp};
use crate::ClientResult;

#[derive(Debug, Default)]
pub struct ImportRunOptions<'a> {
    pub path: Option<String>,
    pub dry_run: bool,
    pub home_override: Option<&'a Path>,
    pub stdin_override: Option<String>,
}

pub fn run(path: Option<String>, dry_run: bool) -> ClientResult<SuccessEnvelope> {
    run_with_options(ImportRunOptions {
        path,
        dry_run,
        home_override: None,
        stdin_override: None,
    })
}

/// Tolerant bulk import: unreadable records are excluded and reported,
/// records whose id already exists are skipped, everything else is written
/// in one transaction.
#[doc(hidden)]
pub fn run_with_options(options: ImportRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let source = resolve_source(options.path.as_deref(), options.stdin_override)?;
    let mut parsed = parse_source(&source.content)?;
    assign_missing_ids(&mut parsed.records);
    let batch = normalize_json(&parsed.records)?;

    let setup = load_setup(options.home_override)?;
    let (mut connection, db_path) = open_writer(&setup)?;
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let timestamp = now_timestamp();
    let mut skipped_ids = Vec::new();
    let mut inserted = 0_i64;
    for movement in &batch.movements {
        if movements::exists(&transaction, &db_path, &movement.id)?
            || skipped_ids.contains(&movement.id)
        {
            skipped_ids.push(movement.id.clone());
            continue;
        }
        movements::insert(&transaction, &db_path, movement, SOURCE_IMPORT, &timestamp)?;
        inserted += 1;
    }

    if options.dry_run {
        transaction
            .rollback()
            .map_err(|error| map_sqlite_error(&db_path, &error))?;
    } else {
        transaction
            .commit()
            .map_err(|error| map_sqlite_error(&db_path, &error))?;
    }

    tracing::info!(
        read = batch.records_read,
        excluded = batch.records_excluded,
        inserted,
        skipped = skipped_ids.len(),
        dry_run = options.dry_run,
        "import finished"
    );

    let message = match (options.dry_run, batch.records_excluded) {
        (true, 0) => "Dry run passed. No rows were written.".to_string(),
        (true, excluded) => {
            format!("Dry run finished. {excluded} record(s) would be excluded. No rows were written.")
        }
        (false, 0) => format!("Imported {inserted} movement(s)."),
        (false, excluded) => {
            format!("Imported {inserted} movement(s); {excluded} record(s) were excluded.")
        }
    };

    let context_setup = if options.dry_run {
        setup
    } else {
        load_setup(options.home_override)?
    };

    let summary = ImportSummary {
        records_read: batch.records_read as i64,
        records_valid: batch.movements.len() as i64,
        records_excluded: batch.records_excluded as i64,
        inserted: if options.dry_run { 0 } else { inserted },
        skipped_existing: skipped_ids.len() as i64,
    };

    success(
        "import",
        ImportData {
            dry_run: options.dry_run,
            path: options.path,
            source_used: source.source_kind.as_str().to_string(),
            format: parsed.format.as_str().to_string(),
            message,
            summary,
            skipped_ids,
            diagnostics: batch.diagnostics,
            ledger: ledger_context(&context_setup),
        },
    )
}
