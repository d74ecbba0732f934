use std::path::Path;

use crate::ClientResult;
use crate::commands::common::{RateInput, load_setup, load_snapshot};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::SummaryData;
use crate::ledger::aggregate::{AggregateParams, report_from_batch};
use crate::ledger::date::{DateRange, parse_iso_date_strict, today};

#[derive(Debug, Default)]
pub struct SummaryOptions<'a> {
    pub as_of: Option<String>,
    pub rate: Option<RateInput>,
    pub home_override: Option<&'a Path>,
}

pub fn run(as_of: Option<String>, rate: Option<RateInput>) -> ClientResult<SuccessEnvelope> {
    run_with_options(SummaryOptions {
        as_of,
        rate,
        home_override: None,
    })
}

/// Summary cards: totals for the calendar month of `as_of`, balances up to
/// `as_of`, and pending exposure for the same month.
#[doc(hidden)]
pub fn run_with_options(options: SummaryOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let as_of = match options.as_of.as_deref() {
        Some(value) => parse_iso_date_strict(value, "as_of", "summary")?,
        None => today(),
    };
    let period = DateRange::month_of(as_of);

    let setup = load_setup(options.home_override)?;
    let snapshot = load_snapshot(&setup, options.rate.as_ref())?;
    let params = AggregateParams {
        period: Some(period),
        as_of,
        exchange_rate: snapshot.rate,
    };
    let report = report_from_batch(snapshot.batch, &params);

    success(
        "summary",
        SummaryData {
            as_of,
            period,
            exchange_rate: snapshot.rate_data,
            rate_status: report.summary.pending_totals.local_equivalent.rate_status,
            summary: report.summary,
            records_read: report.records_read as i64,
            records_excluded: report.records_excluded as i64,
            diagnostics: report.diagnostics,
        },
    )
}
