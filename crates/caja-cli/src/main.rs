mod cli;
mod dispatch;
mod output;
mod stdout_io;

use std::process::ExitCode;

use caja_client::ClientError;
use clap::{Parser, error::ErrorKind};
use stdout_io::write_stdout_text;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "CAJA_LOG";

const ROOT_HELP: &str = "Caja - cash ledger for event businesses

Usage:
  caja <command>

Start here:
  caja summary
  caja movement create --help
  caja import --help
";

const TOP_LEVEL_HELP: &str = "Caja - cash ledger for event businesses

USAGE: caja <command>

Record movements:
  caja movement create --kind inflow --method cash --currency local --amount 1500 --expected 2024-03-10
  caja movement list --status pending                       List movements still to collect or pay
  caja movement settle <id> --on <YYYY-MM-DD>               Mark a pending movement as settled
  caja movement edit <id> --amount 1600                     Change fields of a movement
  caja movement delete <id>                                 Delete a movement

Import an export:
  1. caja import --help                                     Read accepted formats and fields
  2. caja import --dry-run <path>                           Validate without writing
  3. caja import <path>                                     Write the valid records

See where the money is:
  caja summary [--as-of <YYYY-MM-DD>]                       Month totals, balances and pending exposure
  caja report daily --date <YYYY-MM-DD>                     One day, with categories
  caja report monthly --month <YYYY-MM>                     One month, with categories

Exchange rate:
  caja rate set --buy <amount> --sell <amount>              Record today's quote
  caja rate show                                            Current quote and history
  Pass --rate-buy and --rate-sell to summary or report to use a one-off quote.

Add --json to any command for machine-readable output.
Set CAJA_HOME to choose the ledger directory and CAJA_LOG (e.g. `debug`) for diagnostics on stderr.
";

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

/// Diagnostics go to stderr so stdout stays parseable in `--json` mode.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 {
        if write_stdout_text(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }
    let parsed = cli::Cli::try_parse();
    let cli = match parsed {
        Ok(value) => value,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                let text = if err.kind() == ErrorKind::DisplayHelp
                    && is_top_level_help_request(&raw_args)
                {
                    TOP_LEVEL_HELP.to_string()
                } else {
                    err.to_string()
                };
                if write_stdout_text(&text).is_err() {
                    return Err(ExitCode::from(2));
                }
                return Ok(ExitCode::SUCCESS);
            }
            let command_hint = if matches!(
                err.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::InvalidValue
                    | ErrorKind::ValueValidation
                    | ErrorKind::WrongNumberOfValues
                    | ErrorKind::UnknownArgument
                    | ErrorKind::InvalidSubcommand
                    | ErrorKind::ArgumentConflict
            ) {
                command_path_from_args(&raw_args)
            } else {
                None
            };
            let clean_message = strip_clap_boilerplate(&err.to_string());
            let parse_error =
                ClientError::invalid_argument_for_command(&clean_message, command_hint.as_deref());
            let mode = infer_requested_output_mode(&raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            return Err(ExitCode::from(1));
        }
    };
    let mode = output::mode_for_command(&cli.command);

    let dispatched = dispatch::dispatch(&cli);
    match dispatched {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            tracing::debug!(code = %error.code, "command failed");
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Strips clap's trailing boilerplate (Usage line, "For more information" hint)
/// so our "What to do next" section is the single source of guidance.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

/// Builds the subcommand path ("movement settle", "report monthly", ...) from
/// the non-flag arguments for help hints.
fn command_path_from_args(raw_args: &[String]) -> Option<String> {
    let non_flags: Vec<&str> = raw_args
        .iter()
        .skip(1)
        .filter(|value| !value.starts_with('-'))
        .map(String::as_str)
        .collect();

    let hint = match non_flags.as_slice() {
        ["movement", sub @ ("create" | "list" | "edit" | "settle" | "delete"), ..] => {
            return Some(format!("movement {sub}"));
        }
        ["movement", ..] => "movement",
        ["report", sub @ ("daily" | "monthly"), ..] => {
            return Some(format!("report {sub}"));
        }
        ["report", ..] => "report",
        ["rate", sub @ ("set" | "show"), ..] => return Some(format!("rate {sub}")),
        ["rate", ..] => "rate",
        ["import", ..] => "import",
        ["summary", ..] => "summary",
        _ => return None,
    };
    Some(hint.to_string())
}

fn exit_code_for_error(error: &ClientError) -> ExitCode {
    if is_internal_error(error) {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}

fn is_internal_error(error: &ClientError) -> bool {
    error.code.starts_with("internal_")
        || matches!(
            error.code.as_str(),
            "ledger_init_permission_denied"
                | "ledger_locked"
                | "ledger_corrupt"
                | "migration_failed"
                | "ledger_init_failed"
        )
}
