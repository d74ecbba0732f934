use std::path::Path;

use chrono::NaiveDate;

use crate::ClientResult;
use crate::commands::common::{RateInput, load_setup, load_snapshot};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::ReportData;
use crate::ledger::aggregate::{AggregateParams, category_totals, report_from_batch};
use crate::ledger::date::{DateRange, parse_iso_date_strict, parse_month};

#[derive(Debug, Default)]
pub struct DailyReportOptions<'a> {
    pub date: String,
    pub rate: Option<RateInput>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct MonthlyReportOptions<'a> {
    pub month: String,
    pub rate: Option<RateInput>,
    pub home_override: Option<&'a Path>,
}

pub fn daily(date: String, rate: Option<RateInput>) -> ClientResult<SuccessEnvelope> {
    daily_with_options(DailyReportOptions {
        date,
        rate,
        home_override: None,
    })
}

/// Daily cash report: the window is the single day and balances are taken
/// at its close.
#[doc(hidden)]
pub fn daily_with_options(options: DailyReportOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let date = parse_iso_date_strict(&options.date, "date", "report daily")?;
    build_report(
        "report daily",
        "daily",
        DateRange::day(date),
        date,
        options.rate.as_ref(),
        options.home_override,
    )
}

pub fn monthly(month: String, rate: Option<RateInput>) -> ClientResult<SuccessEnvelope> {
    monthly_with_options(MonthlyReportOptions {
        month,
        rate,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn monthly_with_options(options: MonthlyReportOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let period = parse_month(&options.month, "report monthly")?;
    build_report(
        "report monthly",
        "monthly",
        period,
        period.end,
        options.rate.as_ref(),
        options.home_override,
    )
}

fn build_report(
    command: &str,
    report_name: &str,
    period: DateRange,
    as_of: NaiveDate,
    rate: Option<&RateInput>,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(home_override)?;
    let snapshot = load_snapshot(&setup, rate)?;
    let categories = category_totals(&snapshot.batch.movements, Some(&period));
    let params = AggregateParams {
        period: Some(period),
        as_of,
        exchange_rate: snapshot.rate,
    };
    let report = report_from_batch(snapshot.batch, &params);

    success(
        command,
        ReportData {
            report: report_name.to_string(),
            as_of,
            period,
            exchange_rate: snapshot.rate_data,
            rate_status: report.summary.pending_totals.local_equivalent.rate_status,
            summary: report.summary,
            categories,
            records_read: report.records_read as i64,
            records_excluded: report.records_excluded as i64,
            diagnostics: report.diagnostics,
        },
    )
}
