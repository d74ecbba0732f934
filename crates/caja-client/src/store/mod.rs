//! SQLite-backed movement and exchange-rate storage plus the input parsing
//! that feeds it.

pub(crate) mod input;
pub(crate) mod movements;
pub(crate) mod parse;
pub(crate) mod rates;
pub(crate) mod validate;

use chrono::{SecondsFormat, Utc};
use ulid::Ulid;

use crate::ClientError;

pub(crate) const SOURCE_MANUAL: &str = "manual";
pub(crate) const SOURCE_IMPORT: &str = "import";

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn new_movement_id() -> String {
    format!("mov_{}", Ulid::new())
}

pub(crate) fn invalid_input_error(message: &str) -> ClientError {
    ClientError::invalid_argument_with_recovery(
        message,
        vec![
            "Provide a JSON array or CSV input via path or stdin.".to_string(),
            "Run `caja import --help` to confirm accepted fields.".to_string(),
        ],
    )
    .with_import_help_data(serde_json::json!({}))
}
