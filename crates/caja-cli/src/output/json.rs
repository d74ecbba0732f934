use std::io;

use caja_client::{ClientError, SuccessEnvelope};
use serde::Serialize;
use serde_json::{Value, json};

const JSON_VERSION: &str = "v1";

const JSON_COMMANDS: [&str; 11] = [
    "movement create",
    "movement list",
    "movement edit",
    "movement settle",
    "movement delete",
    "import",
    "summary",
    "report daily",
    "report monthly",
    "rate set",
    "rate show",
];

pub fn render_success_json(success: &SuccessEnvelope) -> io::Result<String> {
    if !JSON_COMMANDS.contains(&success.command.as_str()) {
        return Err(io::Error::other(format!(
            "JSON output is not supported for command `{}`",
            success.command
        )));
    }

    serialize_json_pretty(&json!({
        "ok": true,
        "version": JSON_VERSION,
        "command": success.command,
        "data": success.data.clone(),
    }))
}

pub fn render_error_json(error: &ClientError) -> io::Result<String> {
    let mut payload = json!({
        "error": {
            "code": error.code,
            "message": error.message,
            "recovery_steps": error.recovery_steps,
        }
    });
    if let Some(data) = &error.data
        && let Some(object) = payload.as_object_mut()
    {
        object.insert("data".to_string(), data.clone());
    }
    serialize_json_pretty(&payload)
}

fn serialize_json_pretty<T>(value: &T) -> io::Result<String>
where
    T: Serialize,
{
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}
