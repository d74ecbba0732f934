use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

const BOOTSTRAP_SQL: &str = include_str!("migrations/0001_bootstrap.sql");
const EXCHANGE_RATES_SQL: &str = include_str!("migrations/0002_exchange_rates.sql");

const MIGRATION_SOURCES: [&str; 2] = [BOOTSTRAP_SQL, EXCHANGE_RATES_SQL];

pub const EXPECTED_USER_VERSION: i64 = MIGRATION_SOURCES.len() as i64;

pub const REQUIRED_TABLES: [(&str, &[&str]); 3] = [
    ("internal_meta", &["key", "value"]),
    (
        "internal_movements",
        &[
            "movement_id",
            "kind",
            "payment_method",
            "currency",
            "amount",
            "expected_date",
            "effective_date",
            "category",
            "subcategory",
            "detail",
            "client_ref",
            "provider_ref",
            "event_ref",
            "team_member_ref",
            "source_kind",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "internal_exchange_rates",
        &["rate_id", "buy", "sell", "source", "recorded_at"],
    ),
];

pub const REQUIRED_INDEX_NAMES: [&str; 3] = [
    "idx_internal_movements_expected_date",
    "idx_internal_movements_effective_date",
    "idx_internal_exchange_rates_recorded_at",
];

pub const REQUIRED_META_KEYS: [(&str, &str); 2] = [
    ("schema_version", "v1"),
    ("movement_contract_version", "v1"),
];

const REPAIR_START: &str = "-- caja:safe_repair:start:";
const REPAIR_END: &str = "-- caja:safe_repair:end:";

pub fn run_pending(conn: &mut Connection) -> rusqlite_migration::Result<()> {
    let migrations = Migrations::new(MIGRATION_SOURCES.into_iter().map(M::up).collect());
    migrations.to_latest(conn)
}

/// Returns the SQL between the `safe_repair` markers named `object_name` in
/// the migration files. Only objects that can be rebuilt without touching
/// data carry markers.
pub fn safe_repair_statement(object_name: &str) -> Option<String> {
    MIGRATION_SOURCES
        .iter()
        .find_map(|source| repair_block(source, object_name))
}

fn repair_block(source: &str, object_name: &str) -> Option<String> {
    let mut lines = source.lines();
    lines.find(|line| line.trim().strip_prefix(REPAIR_START) == Some(object_name))?;

    let mut statement = String::new();
    for line in lines {
        if line.trim().strip_prefix(REPAIR_END) == Some(object_name) {
            return Some(statement.trim().to_string());
        }
        statement.push_str(line);
        statement.push('\n');
    }
    // unterminated block
    None
}
