use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDate(pub String);

impl IsoDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn parse_iso_date(value: &str) -> Result<IsoDate, String> {
    if value.len() != 10 {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return Err("date must use YYYY-MM-DD format".to_string());
        }
    }

    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err("date must use valid calendar values".to_string());
    }

    Ok(IsoDate(value.to_string()))
}

pub fn parse_month(value: &str) -> Result<String, String> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 7
        && bytes[4] == b'-'
        && [0usize, 1, 2, 3, 5, 6]
            .iter()
            .all(|index| bytes[*index].is_ascii_digit());
    if !shaped {
        return Err("month must use YYYY-MM format".to_string());
    }
    if NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").is_err() {
        return Err("month must use valid calendar values".to_string());
    }
    Ok(value.to_string())
}

/// Extended help shown after `caja import --help`.
pub const IMPORT_AFTER_HELP: &str = "\
How import works:
  Export movements from the hosted backend (or write them by hand) as a
  JSON array or CSV, then import the file. Records that cannot be read are
  excluded and listed; every other record is written.

  Accepted formats:
    JSON  one top-level array of movement objects
          (a backend list response with an `items` array also works)
    CSV   one header row with field names

  <path> is a local file path. Use `-` to read stdin.
  Example: cat movements.json | caja import --dry-run -

What to do next:
  1. Run `caja import --dry-run <path>` and review excluded records.
  2. Run `caja import <path>` to write the valid records.
  3. Run `caja summary` to see the current month.

Import fields:
  JSON example:
  [
    {
      \"id\": \"pb_001\",
      \"kind\": \"inflow\",
      \"payment_method\": \"cash\",
      \"currency\": \"local\",
      \"amount\": 1500.50,
      \"expected_date\": \"2024-03-10\",
      \"effective_date\": \"2024-03-10\",
      \"category\": \"Eventos\"
    }
  ]

  CSV example:
  id,kind,payment_method,currency,amount,expected_date,effective_date,category
  pb_001,inflow,cash,local,1500.50,2024-03-10,2024-03-10,Eventos
  pb_002,outflow,wire_transfer,foreign,200,2024-03-12,,Catering

Field rules:
  kind (required):            inflow | outflow (also: cobro, pago)
  payment_method (required):  cash | wire_transfer | other
                              (also: efectivo, transferencia, otro)
  currency (required):        local | foreign (also: ars, usd)
  amount (required):          positive number
  expected_date (optional):   YYYY-MM-DD; backend timestamps are accepted
  effective_date (optional):  settlement date; empty means pending
  id (optional):              records whose id already exists are skipped;
                              missing ids are generated
  category, subcategory, detail, client_ref, provider_ref, event_ref,
  team_member_ref (optional): free text

  Backend column names (tipo, metodoPago, moneda, monto, fechaEsperado,
  fechaEfectuado, categoria, ...) are accepted in place of the names above.
";

#[derive(Debug, Parser)]
#[command(
    name = "caja",
    version,
    about = "cash ledger for event businesses",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record, list, edit, settle and delete cash movements
    #[command(arg_required_else_help = true)]
    Movement {
        #[command(subcommand)]
        command: MovementCommand,
    },
    /// Bulk import movements from a JSON or CSV export
    #[command(after_long_help = IMPORT_AFTER_HELP)]
    Import {
        /// Validate and report without writing to the ledger
        #[arg(long)]
        dry_run: bool,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
        /// Path to a JSON or CSV file (use `-` for stdin)
        path: Option<String>,
    },
    /// Show totals for the current month, balances and pending exposure
    Summary {
        /// Balance cut-off date; the period is its calendar month (default: today)
        #[arg(long, value_parser = parse_iso_date)]
        as_of: Option<IsoDate>,
        #[command(flatten)]
        rate: RateOverrideArgs,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Daily and monthly cash reports
    #[command(arg_required_else_help = true)]
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
    /// Record and inspect the buy/sell exchange rate
    #[command(arg_required_else_help = true)]
    Rate {
        #[command(subcommand)]
        command: RateCommand,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct MovementFieldArgs {
    /// inflow or outflow
    #[arg(long)]
    pub kind: Option<String>,
    /// cash, wire_transfer or other
    #[arg(long = "method")]
    pub payment_method: Option<String>,
    /// local or foreign
    #[arg(long)]
    pub currency: Option<String>,
    /// Positive amount with at most 2 decimal places
    #[arg(long)]
    pub amount: Option<String>,
    /// Date the movement is expected (YYYY-MM-DD)
    #[arg(long = "expected")]
    pub expected_date: Option<String>,
    /// Date the movement settled (YYYY-MM-DD)
    #[arg(long = "effective")]
    pub effective_date: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub subcategory: Option<String>,
    #[arg(long)]
    pub detail: Option<String>,
    /// Client reference
    #[arg(long = "client")]
    pub client_ref: Option<String>,
    /// Provider reference
    #[arg(long = "provider")]
    pub provider_ref: Option<String>,
    /// Event reference
    #[arg(long = "event")]
    pub event_ref: Option<String>,
    /// Team member reference
    #[arg(long = "member")]
    pub team_member_ref: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RateOverrideArgs {
    /// Buy rate for this command only (requires --rate-sell)
    #[arg(long, requires = "rate_sell")]
    pub rate_buy: Option<String>,
    /// Sell rate for this command only (requires --rate-buy)
    #[arg(long, requires = "rate_buy")]
    pub rate_sell: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum MovementCommand {
    /// Record a new movement
    Create {
        #[command(flatten)]
        fields: MovementFieldArgs,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// List stored movements with filters and paging
    List {
        /// all, pending or settled
        #[arg(long)]
        status: Option<String>,
        /// inflow or outflow
        #[arg(long)]
        kind: Option<String>,
        /// local or foreign
        #[arg(long)]
        currency: Option<String>,
        /// cash, wire_transfer or other
        #[arg(long = "method")]
        payment_method: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Date the --from/--to window applies to: expected or effective
        #[arg(long)]
        date_field: Option<String>,
        /// Start date filter (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        from: Option<IsoDate>,
        /// End date filter (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        to: Option<IsoDate>,
        /// expected_date, effective_date, amount or created_at
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        per_page: Option<i64>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Change fields of an existing movement
    Edit {
        /// The movement ID (e.g. mov_01J...)
        movement_id: String,
        #[command(flatten)]
        fields: MovementFieldArgs,
        /// Mark the movement as pending again
        #[arg(long, conflicts_with = "effective_date")]
        clear_effective: bool,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Mark a pending movement as settled
    Settle {
        /// The movement ID (e.g. mov_01J...)
        movement_id: String,
        /// Settlement date (default: today)
        #[arg(long, value_parser = parse_iso_date)]
        on: Option<IsoDate>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Delete a movement
    Delete {
        /// The movement ID (e.g. mov_01J...)
        movement_id: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ReportCommand {
    /// Cash report for a single day
    Daily {
        /// Report date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        date: IsoDate,
        #[command(flatten)]
        rate: RateOverrideArgs,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Cash report for a calendar month
    Monthly {
        /// Report month (YYYY-MM)
        #[arg(long, value_parser = parse_month)]
        month: String,
        #[command(flatten)]
        rate: RateOverrideArgs,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum RateCommand {
    /// Record a new buy/sell quote
    Set {
        /// Local units received per foreign unit bought from you
        #[arg(long)]
        buy: String,
        /// Local units paid per foreign unit sold to you
        #[arg(long)]
        sell: String,
        /// Where the quote came from
        #[arg(long)]
        source: Option<String>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Show the current quote and recent history
    Show {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
