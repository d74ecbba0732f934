use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::aggregate::{CategoryTotals, LedgerSummary};
use crate::ledger::date::DateRange;
use crate::ledger::normalize::NormalizeDiagnostic;
use crate::ledger::rates::RateStatus;
use crate::ledger::types::FinancialMovement;

#[derive(Debug, Clone, Serialize)]
pub struct DataRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerContext {
    pub db_path: String,
    pub schema_version: String,
    pub movement_count: i64,
    pub data_range: DataRange,
}

/// One field-level problem found by create / edit / rate validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementData {
    pub action: String,
    pub status: String,
    pub movement: FinancialMovement,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementDeleteData {
    pub movement_id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementListFilters {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub date_field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub sort: String,
    pub direction: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementListData {
    pub filters: MovementListFilters,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub returned: i64,
    pub movements: Vec<FinancialMovement>,
    pub diagnostics: Vec<NormalizeDiagnostic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub records_read: i64,
    pub records_valid: i64,
    pub records_excluded: i64,
    pub inserted: i64,
    pub skipped_existing: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportData {
    pub dry_run: bool,
    pub path: Option<String>,
    pub source_used: String,
    pub format: String,
    pub message: String,
    pub summary: ImportSummary,
    pub skipped_ids: Vec<String>,
    pub diagnostics: Vec<NormalizeDiagnostic>,
    pub ledger: LedgerContext,
}

#[derive(Debug, Clone, Serialize)]
pub struct RateData {
    pub buy: Decimal,
    pub sell: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// `stored` for the latest recorded quote, `override` for per-command flags.
    pub origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RateShowData {
    pub current: RateData,
    pub history: Vec<RateData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub as_of: NaiveDate,
    pub period: DateRange,
    pub exchange_rate: Option<RateData>,
    pub rate_status: RateStatus,
    pub summary: LedgerSummary,
    pub records_read: i64,
    pub records_excluded: i64,
    pub diagnostics: Vec<NormalizeDiagnostic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub report: String,
    pub as_of: NaiveDate,
    pub period: DateRange,
    pub exchange_rate: Option<RateData>,
    pub rate_status: RateStatus,
    pub summary: LedgerSummary,
    pub categories: Vec<CategoryTotals>,
    pub records_read: i64,
    pub records_excluded: i64,
    pub diagnostics: Vec<NormalizeDiagnostic>,
}
