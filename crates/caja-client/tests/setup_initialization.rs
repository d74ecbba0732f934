use std::fs;
use std::path::PathBuf;

use caja_client::setup::{SetupContext, ensure_initialized_at};
use rusqlite::{Connection, OptionalExtension};
use tempfile::{TempDir, tempdir};

struct Ledger {
    _dir: TempDir,
    home: PathBuf,
    context: SetupContext,
}

fn fresh_ledger() -> Option<Ledger> {
    let dir = tempdir().ok()?;
    let home = dir.path().join("ledger-home");
    let context = ensure_initialized_at(&home);
    assert!(context.is_ok(), "setup failed: {context:?}");
    Some(Ledger {
        _dir: dir,
        home,
        context: context.ok()?,
    })
}

fn tamper(ledger: &Ledger, sql: &str) {
    let connection = Connection::open(&ledger.context.db_path);
    assert!(connection.is_ok());
    if let Ok(conn) = connection {
        let applied = conn.execute_batch(sql);
        assert!(applied.is_ok(), "tamper failed: {applied:?}");
    }
}

fn inspect<T>(ledger: &Ledger, read: impl FnOnce(&Connection) -> T) -> Option<T> {
    let connection = Connection::open(&ledger.context.db_path).ok()?;
    Some(read(&connection))
}

fn object_exists(connection: &Connection, object_type: &str, name: &str) -> bool {
    connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2",
            [object_type, name],
            |_row| Ok(()),
        )
        .optional()
        .ok()
        .flatten()
        .is_some()
}

fn has_column(connection: &Connection, table: &str, column: &str) -> bool {
    connection
        .query_row(
            "SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2",
            [table, column],
            |_row| Ok(()),
        )
        .optional()
        .ok()
        .flatten()
        .is_some()
}

fn meta_value(connection: &Connection, key: &str) -> Option<String> {
    connection
        .query_row(
            "SELECT value FROM internal_meta WHERE key = ?1",
            [key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .ok()
        .flatten()
}

fn error_code_after_reopen(ledger: &Ledger) -> Option<String> {
    ensure_initialized_at(&ledger.home).err().map(|error| error.code)
}

#[test]
fn first_run_creates_an_empty_ledger() {
    let ledger = fresh_ledger();
    assert!(ledger.is_some());
    if let Some(ledger) = ledger {
        assert!(ledger.home.join("ledger.db").exists());
        assert!(ledger.context.db_path.ends_with("ledger.db"));
        assert_eq!(ledger.context.schema_version, "v1");
        assert_eq!(ledger.context.movement_count, 0);
        assert!(ledger.context.data_range.earliest.is_none());
        assert!(ledger.context.data_range.latest.is_none());
    }
}

#[test]
fn reopening_is_idempotent_and_keeps_user_version() {
    let ledger = fresh_ledger();
    assert!(ledger.is_some());
    if let Some(ledger) = ledger {
        for _ in 0..2 {
            let reopened = ensure_initialized_at(&ledger.home);
            assert!(reopened.is_ok());
            if let Ok(context) = reopened {
                assert_eq!(context.db_path, ledger.context.db_path);
            }
        }
        let version = inspect(&ledger, |conn| {
            conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
                .ok()
        });
        assert_eq!(version.flatten(), Some(2));
    }
}

#[test]
fn schema_carries_movement_and_rate_tables() {
    let ledger = fresh_ledger();
    assert!(ledger.is_some());
    if let Some(ledger) = ledger {
        let checked = inspect(&ledger, |conn| {
            assert!(object_exists(conn, "table", "internal_movements"));
            assert!(object_exists(conn, "table", "internal_exchange_rates"));
            for column in [
                "kind",
                "payment_method",
                "currency",
                "amount",
                "expected_date",
                "effective_date",
                "team_member_ref",
            ] {
                assert!(has_column(conn, "internal_movements", column), "{column}");
            }
            assert!(has_column(conn, "internal_exchange_rates", "buy"));
            assert!(has_column(conn, "internal_exchange_rates", "sell"));
            assert!(object_exists(
                conn,
                "index",
                "idx_internal_exchange_rates_recorded_at"
            ));
            assert_eq!(
                meta_value(conn, "movement_contract_version").as_deref(),
                Some("v1")
            );
        });
        assert!(checked.is_some());
    }
}

#[test]
fn data_range_falls_back_to_effective_date() {
    let ledger = fresh_ledger();
    assert!(ledger.is_some());
    if let Some(ledger) = ledger {
        tamper(
            &ledger,
            "INSERT INTO internal_movements (movement_id, kind, payment_method, currency, amount,
                 expected_date, effective_date, source_kind, created_at, updated_at)
             VALUES
                 ('a', 'inflow', 'cash', 'local', '10', '2024-02-01', NULL, 'manual', 't', 't'),
                 ('b', 'outflow', 'cash', 'local', '5', NULL, '2023-12-30', 'import', 't', 't');",
        );

        let reopened = ensure_initialized_at(&ledger.home);
        assert!(reopened.is_ok());
        if let Ok(context) = reopened {
            assert_eq!(context.movement_count, 2);
            assert_eq!(context.data_range.earliest.as_deref(), Some("2023-12-30"));
            assert_eq!(context.data_range.latest.as_deref(), Some("2024-02-01"));
        }
    }
}

#[test]
fn dropped_index_is_rebuilt() {
    let ledger = fresh_ledger();
    assert!(ledger.is_some());
    if let Some(ledger) = ledger {
        tamper(&ledger, "DROP INDEX idx_internal_movements_effective_date;");
        assert!(ensure_initialized_at(&ledger.home).is_ok());
        let restored = inspect(&ledger, |conn| {
            object_exists(conn, "index", "idx_internal_movements_effective_date")
        });
        assert_eq!(restored, Some(true));
    }
}

#[test]
fn deleted_meta_key_is_restored() {
    let ledger = fresh_ledger();
    assert!(ledger.is_some());
    if let Some(ledger) = ledger {
        tamper(
            &ledger,
            "DELETE FROM internal_meta WHERE key = 'movement_contract_version';",
        );
        assert!(ensure_initialized_at(&ledger.home).is_ok());
        let restored = inspect(&ledger, |conn| meta_value(conn, "movement_contract_version"));
        assert_eq!(restored.flatten().as_deref(), Some("v1"));
    }
}

#[test]
fn drifted_meta_value_is_rejected() {
    let ledger = fresh_ledger();
    assert!(ledger.is_some());
    if let Some(ledger) = ledger {
        tamper(
            &ledger,
            "UPDATE internal_meta SET value = 'v9' WHERE key = 'movement_contract_version';",
        );
        assert_eq!(
            error_code_after_reopen(&ledger).as_deref(),
            Some("ledger_corrupt")
        );
    }
}

#[test]
fn missing_table_or_column_is_rejected() {
    let ledger = fresh_ledger();
    assert!(ledger.is_some());
    if let Some(ledger) = ledger {
        tamper(&ledger, "DROP TABLE internal_exchange_rates;");
        assert_eq!(
            error_code_after_reopen(&ledger).as_deref(),
            Some("ledger_corrupt")
        );
    }

    let ledger = fresh_ledger();
    assert!(ledger.is_some());
    if let Some(ledger) = ledger {
        tamper(&ledger, "ALTER TABLE internal_movements DROP COLUMN detail;");
        assert_eq!(
            error_code_after_reopen(&ledger).as_deref(),
            Some("ledger_corrupt")
        );
    }
}

#[test]
fn exclusive_lock_maps_to_ledger_locked() {
    let ledger = fresh_ledger();
    assert!(ledger.is_some());
    if let Some(ledger) = ledger {
        let connection = Connection::open(&ledger.context.db_path);
        assert!(connection.is_ok());
        if let Ok(conn) = connection {
            assert!(conn.execute_batch("BEGIN EXCLUSIVE;").is_ok());
            assert_eq!(
                error_code_after_reopen(&ledger).as_deref(),
                Some("ledger_locked")
            );
            assert!(conn.execute_batch("ROLLBACK;").is_ok());
        }
    }
}

#[test]
fn garbage_file_maps_to_ledger_corrupt() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(temp_dir) = temp {
        let home = temp_dir.path().join("ledger-home");
        assert!(fs::create_dir_all(&home).is_ok());
        assert!(fs::write(home.join("ledger.db"), "not-a-sqlite-database").is_ok());

        let result = ensure_initialized_at(&home);
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "ledger_corrupt");
        }
    }
}
