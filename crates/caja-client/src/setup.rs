use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::contracts::types::DataRange;
use crate::migrations::{
    EXPECTED_USER_VERSION, REQUIRED_INDEX_NAMES, REQUIRED_META_KEYS, REQUIRED_TABLES, run_pending,
    safe_repair_statement,
};
use crate::state::{
    ensure_ledger_directory, ledger_db_path, map_sqlite_error, open_connection, resolve_ledger_home,
};
use crate::{ClientError, ClientResult};

/// What every command learns about the ledger file before it runs.
#[derive(Debug, Clone)]
pub struct SetupContext {
    pub db_path: String,
    pub schema_version: String,
    pub movement_count: i64,
    pub data_range: DataRange,
}

pub fn ensure_initialized_at(home: &Path) -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(Some(home))
}

/// Opens (creating on first use) the ledger under the resolved home, brings
/// the schema to the latest migration and checks it is one we can trust.
pub(crate) fn ensure_initialized_with_home_override(
    home_override: Option<&Path>,
) -> ClientResult<SetupContext> {
    let home = resolve_ledger_home(home_override)?;
    ensure_ledger_directory(&home)?;

    let db_path = ledger_db_path(&home);
    let mut connection = open_connection(&db_path)?;
    run_pending(&mut connection).map_err(|error| map_migration_error(&db_path, &error))?;

    let ledger = LedgerFile {
        connection: &connection,
        db_path: &db_path,
    };
    ledger.require_tables()?;
    ledger.restore_missing_objects()?;
    ledger.require_consistent_state()?;

    let schema_version = ledger
        .meta_value("schema_version")?
        .unwrap_or_else(|| "v1".to_string());
    let (movement_count, data_range) = ledger.movement_stats()?;

    tracing::debug!(db_path = %db_path.display(), movement_count, "ledger ready");

    Ok(SetupContext {
        db_path: db_path.display().to_string(),
        schema_version,
        movement_count,
        data_range,
    })
}

fn map_migration_error(db_path: &Path, error: &rusqlite_migration::Error) -> ClientError {
    if let rusqlite_migration::Error::RusqliteError { err, .. } = error {
        let mapped = map_sqlite_error(db_path, err);
        if matches!(
            mapped.code.as_str(),
            "ledger_locked" | "ledger_corrupt" | "ledger_init_permission_denied"
        ) {
            return mapped;
        }
    }
    ClientError::migration_failed(db_path, &error.to_string())
}

struct LedgerFile<'a> {
    connection: &'a Connection,
    db_path: &'a Path,
}

impl LedgerFile<'_> {
    fn sqlite<T>(&self, result: rusqlite::Result<T>) -> ClientResult<T> {
        result.map_err(|error| map_sqlite_error(self.db_path, &error))
    }

    fn corrupt(&self) -> ClientError {
        ClientError::ledger_corrupt(self.db_path)
    }

    /// Tables are never recreated: a missing table or column means the file
    /// was edited by something else.
    fn require_tables(&self) -> ClientResult<()> {
        for (table, required_columns) in REQUIRED_TABLES {
            if !self.object_exists("table", table)? {
                return Err(self.corrupt());
            }
            let columns = self.columns_of(table)?;
            if required_columns
                .iter()
                .any(|required| !columns.iter().any(|column| column == required))
            {
                return Err(self.corrupt());
            }
        }
        Ok(())
    }

    /// Missing meta keys and indexes can be rebuilt from the migrations.
    /// Drifted meta values are left for `require_consistent_state` to reject.
    fn restore_missing_objects(&self) -> ClientResult<()> {
        for (key, value) in REQUIRED_META_KEYS {
            self.sqlite(self.connection.execute(
                "INSERT OR IGNORE INTO internal_meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            ))?;
        }

        for index in REQUIRED_INDEX_NAMES {
            if self.object_exists("index", index)? {
                continue;
            }
            let statement = safe_repair_statement(index).ok_or_else(|| {
                ClientError::ledger_init_failed(self.db_path, "Missing canonical SQL for index repair.")
            })?;
            tracing::warn!(index, "recreating missing ledger index");
            self.sqlite(self.connection.execute_batch(&statement))?;
        }
        Ok(())
    }

    fn require_consistent_state(&self) -> ClientResult<()> {
        let user_version = self.sqlite(
            self.connection
                .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0)),
        )?;
        if user_version != EXPECTED_USER_VERSION {
            return Err(self.corrupt());
        }

        for (key, expected) in REQUIRED_META_KEYS {
            if self.meta_value(key)?.as_deref() != Some(expected) {
                return Err(self.corrupt());
            }
        }

        for index in REQUIRED_INDEX_NAMES {
            if !self.object_exists("index", index)? {
                return Err(self.corrupt());
            }
        }
        Ok(())
    }

    fn object_exists(&self, object_type: &str, name: &str) -> ClientResult<bool> {
        let found = self.sqlite(
            self.connection
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2 LIMIT 1",
                    params![object_type, name],
                    |_row| Ok(()),
                )
                .optional(),
        )?;
        Ok(found.is_some())
    }

    fn columns_of(&self, table: &str) -> ClientResult<Vec<String>> {
        let mut statement = self.sqlite(
            self.connection
                .prepare("SELECT name FROM pragma_table_info(?1)"),
        )?;
        let rows = self.sqlite(statement.query_map([table], |row| row.get::<_, String>(0)))?;
        rows.map(|row| self.sqlite(row)).collect()
    }

    fn meta_value(&self, key: &str) -> ClientResult<Option<String>> {
        self.sqlite(
            self.connection
                .query_row(
                    "SELECT value FROM internal_meta WHERE key = ?1 LIMIT 1",
                    [key],
                    |row| row.get::<_, String>(0),
                )
                .optional(),
        )
    }

    /// Imported records may lack an expected date, so the range falls back
    /// to the effective date.
    fn movement_stats(&self) -> ClientResult<(i64, DataRange)> {
        self.sqlite(self.connection.query_row(
            "SELECT COUNT(*),
                    MIN(COALESCE(expected_date, effective_date)),
                    MAX(COALESCE(expected_date, effective_date))
             FROM internal_movements",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    DataRange {
                        earliest: row.get(1)?,
                        latest: row.get(2)?,
                    },
                ))
            },
        ))
    }
}
