mod error_text;
mod format;
mod import_text;
mod json;
mod mode;
mod movement_text;
mod rate_text;
mod report_text;

use std::io;

use caja_client::{ClientError, SuccessEnvelope};

use crate::stdout_io::write_stdout_line;

pub use mode::{OutputMode, mode_for_command};

pub fn print_success(success: &SuccessEnvelope, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Text => render_text_success(success)?,
        OutputMode::Json => json::render_success_json(success)?,
    };
    write_stdout_line(&body)
}

pub fn print_failure(error: &ClientError, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Json => json::render_error_json(error)?,
        OutputMode::Text => error_text::render_error(error),
    };
    write_stdout_line(&body)
}

fn render_text_success(success: &SuccessEnvelope) -> io::Result<String> {
    match success.command.as_str() {
        "movement create" | "movement edit" | "movement settle" => {
            movement_text::render_movement(&success.data)
        }
        "movement list" => movement_text::render_movement_list(&success.data),
        "movement delete" => movement_text::render_movement_delete(&success.data),
        "import" => import_text::render_import_run(&success.data),
        "summary" => report_text::render_summary(&success.data),
        "report daily" | "report monthly" => report_text::render_report(&success.data),
        "rate set" => rate_text::render_rate_set(&success.data),
        "rate show" => rate_text::render_rate_show(&success.data),
        _ => Err(io::Error::other(format!(
            "unsupported text output command `{}`",
            success.command
        ))),
    }
}
