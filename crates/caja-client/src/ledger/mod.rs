//! Pure ledger core: record normalization, aggregation, exchange-rate
//! conversion and presentation formatting. Nothing here touches storage.

pub mod aggregate;
pub mod date;
pub mod money;
pub mod normalize;
pub mod rates;
pub mod types;

pub use aggregate::{
    AggregateParams, AggregateReport, CategoryTotals, LedgerSummary, PendingTotals, aggregate,
    aggregate_json, aggregate_records, category_totals,
};
pub use money::{format_currency, format_currency_text, format_display_date};
pub use normalize::{NormalizeDiagnostic, NormalizedBatch, RawMovement, normalize_json, normalize_records};
pub use rates::{ExchangeRate, LocalEquivalent, RateStatus, to_local};
pub use types::{
    ByCurrency, Currency, FinancialMovement, FlowTotals, MethodBreakdown, MovementKind,
    PaymentMethod,
};
