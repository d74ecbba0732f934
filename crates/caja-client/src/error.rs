use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

use crate::contracts::types::FieldIssue;

pub(crate) const IMPORT_HELP_COMMAND: &str = "caja import --help";
pub(crate) const IMPORT_HELP_SECTION_TITLE: &str = "Import fields";

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_import_help_data(self, data: Value) -> Self {
        self.with_data(merge_import_help_data(data))
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::invalid_argument_for_command(message, None)
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `caja {cmd} --help` for usage."),
            None => "Run `caja --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    /// Raised when the aggregator is handed something other than a list of
    /// records. This is a caller bug, not a data-quality problem.
    pub fn aggregation_input_not_list() -> Self {
        Self::new(
            "aggregation_input_not_list",
            "Aggregation input must be a list of movement records.",
            vec!["Pass a JSON array of movement objects.".to_string()],
        )
    }

    pub fn invalid_import_format(message: &str, received_format: &str) -> Self {
        Self::invalid_argument_with_recovery(
            message,
            vec![
                "Provide a supported import format (JSON array or CSV).".to_string(),
                "Run `caja import --help` to confirm accepted fields.".to_string(),
            ],
        )
        .with_import_help_data(json!({
            "received_format": received_format,
            "supported_formats": ["json_array", "csv"],
        }))
    }

    pub fn import_schema_mismatch(
        required_headers: Vec<String>,
        optional_headers: Vec<String>,
        actual_headers: Vec<String>,
    ) -> Self {
        Self::new(
            "import_schema_mismatch",
            "CSV headers do not match the movement import schema.",
            vec![
                "Include all required headers; optional headers may be omitted.".to_string(),
                "Backend column names such as `tipo` or `monto` are accepted too.".to_string(),
                "Rerun `caja import --dry-run <path>`.".to_string(),
            ],
        )
        .with_import_help_data(json!({
            "required_headers": required_headers,
            "optional_headers": optional_headers,
            "actual_headers": actual_headers,
        }))
    }

    pub fn movement_validation_failed(issues: Vec<FieldIssue>) -> Self {
        let issue_count = issues.len();
        Self::new(
            "movement_validation_failed",
            &format!("Movement failed validation: {issue_count} field(s) need fixes. Nothing was written."),
            vec![
                "Fix the listed fields and rerun the command.".to_string(),
                "Run `caja movement create --help` for accepted values.".to_string(),
            ],
        )
        .with_data(json!({
            "issues": issues,
        }))
    }

    pub fn movement_not_found(movement_id: &str) -> Self {
        Self::new(
            "movement_not_found",
            &format!("Movement `{movement_id}` was not found."),
            vec!["Run `caja movement list` to find a valid movement id.".to_string()],
        )
        .with_data(json!({
            "movement_id": movement_id,
        }))
    }

    pub fn movement_already_settled(movement_id: &str, effective_date: &str) -> Self {
        Self::new(
            "movement_already_settled",
            &format!("Movement `{movement_id}` was already settled on {effective_date}."),
            vec![format!(
                "Use `caja movement edit {movement_id} --effective-date <date>` to change the settlement date."
            )],
        )
        .with_data(json!({
            "movement_id": movement_id,
            "effective_date": effective_date,
        }))
    }

    pub fn exchange_rate_not_set() -> Self {
        Self::new(
            "exchange_rate_not_set",
            "No exchange rate has been recorded yet.",
            vec![
                "Run `caja rate set --buy <amount> --sell <amount>`.".to_string(),
                "Or pass `--rate-buy` and `--rate-sell` to summary and report commands."
                    .to_string(),
            ],
        )
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn ledger_init_permission_denied(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_permission_denied",
            &format!("Cannot initialize ledger at `{location}`: {detail}"),
            vec![format!(
                "Grant write access to `{location}` or set `CAJA_HOME` to a writable directory."
            )],
        )
    }

    pub fn ledger_locked(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_locked",
            &format!("Ledger database is locked at `{location}`."),
            vec![format!(
                "Close other processes using `{location}` so the lock is released."
            )],
        )
    }

    pub fn ledger_corrupt(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_corrupt",
            &format!("Ledger database appears corrupt at `{location}`."),
            vec![format!(
                "Replace `{location}` with a valid SQLite ledger file or restore from backup."
            )],
        )
    }

    pub fn migration_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "migration_failed",
            &format!("Ledger migration failed at `{location}`: {detail}"),
            vec!["Resolve conflicting schema objects referenced in the error details.".to_string()],
        )
    }

    pub fn ledger_init_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_failed",
            &format!("Ledger initialization failed at `{location}`: {detail}"),
            Vec::new(),
        )
    }
}

fn merge_import_help_data(mut data: Value) -> Value {
    if !data.is_object() {
        data = json!({});
    }

    if let Some(object) = data.as_object_mut() {
        object.insert(
            "help_command".to_string(),
            Value::String(IMPORT_HELP_COMMAND.to_string()),
        );
        object.insert(
            "help_section_title".to_string(),
            Value::String(IMPORT_HELP_SECTION_TITLE.to_string()),
        );
    }

    data
}

pub type ClientResult<T> = Result<T, ClientError>;
