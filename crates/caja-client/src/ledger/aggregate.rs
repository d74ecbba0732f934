use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::ClientResult;
use crate::ledger::date::DateRange;
use crate::ledger::normalize::{
    NormalizeDiagnostic, NormalizedBatch, RawMovement, normalize_json, normalize_records,
};
use crate::ledger::rates::{ExchangeRate, LocalEquivalent, to_local};
use crate::ledger::types::{
    ByCurrency, FinancialMovement, FlowTotals, MethodBreakdown, MovementKind,
};

pub const UNCATEGORIZED_LABEL: &str = "uncategorized";

#[derive(Debug, Clone, Copy)]
pub struct AggregateParams {
    /// Inclusive window for period totals; `None` is unbounded.
    pub period: Option<DateRange>,
    pub as_of: NaiveDate,
    pub exchange_rate: Option<ExchangeRate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTotals {
    pub inflow: ByCurrency<Decimal>,
    pub outflow: ByCurrency<Decimal>,
    pub count: usize,
    pub local_equivalent: LocalEquivalent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub period: Option<DateRange>,
    pub as_of: NaiveDate,
    pub period_totals: MethodBreakdown<ByCurrency<FlowTotals>>,
    pub cumulative_balance: MethodBreakdown<ByCurrency<Decimal>>,
    pub pending_totals: PendingTotals,
    pub settled_records: Vec<FinancialMovement>,
    pub pending_records: Vec<FinancialMovement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub summary: LedgerSummary,
    pub records_read: usize,
    pub records_excluded: usize,
    pub diagnostics: Vec<NormalizeDiagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub category: String,
    pub totals: ByCurrency<FlowTotals>,
}

pub fn aggregate(movements: &[FinancialMovement], params: &AggregateParams) -> LedgerSummary {
    let rate = params.exchange_rate.as_ref();
    let mut period_totals = MethodBreakdown::<ByCurrency<FlowTotals>>::default();
    let mut cumulative_balance = MethodBreakdown::<ByCurrency<Decimal>>::default();
    let mut pending_totals = PendingTotals {
        inflow: ByCurrency::default(),
        outflow: ByCurrency::default(),
        count: 0,
        local_equivalent: LocalEquivalent::empty(rate),
    };
    let mut settled_records = Vec::new();
    let mut pending_records = Vec::new();

    for movement in movements {
        let Some(effective_date) = movement.effective_date else {
            if !in_period(params.period.as_ref(), movement.expected_date) {
                continue;
            }
            let bucket = match movement.kind {
                MovementKind::Inflow => &mut pending_totals.inflow,
                MovementKind::Outflow => &mut pending_totals.outflow,
            };
            *bucket.get_mut(movement.currency) += movement.amount;
            pending_totals.count += 1;
            pending_totals.local_equivalent.add(
                movement.kind,
                to_local(movement.amount, movement.currency, movement.kind, rate),
            );
            pending_records.push(movement.clone());
            continue;
        };

        if in_period(params.period.as_ref(), Some(effective_date)) {
            period_totals
                .method_mut(movement.payment_method)
                .get_mut(movement.currency)
                .add(movement.kind, movement.amount);
            period_totals
                .total
                .get_mut(movement.currency)
                .add(movement.kind, movement.amount);
        }

        if effective_date <= params.as_of {
            let signed = movement.kind.signed(movement.amount);
            *cumulative_balance
                .method_mut(movement.payment_method)
                .get_mut(movement.currency) += signed;
            *cumulative_balance.total.get_mut(movement.currency) += signed;
            settled_records.push(movement.clone());
        }
    }

    sort_records(&mut settled_records);
    sort_records(&mut pending_records);

    tracing::debug!(
        movements = movements.len(),
        settled = settled_records.len(),
        pending = pending_records.len(),
        as_of = %params.as_of,
        "aggregated ledger snapshot"
    );

    LedgerSummary {
        period: params.period,
        as_of: params.as_of,
        period_totals,
        cumulative_balance,
        pending_totals,
        settled_records,
        pending_records,
    }
}

pub fn aggregate_records(raw_records: &[RawMovement], params: &AggregateParams) -> AggregateReport {
    report_from_batch(normalize_records(raw_records), params)
}

pub fn aggregate_json(value: &Value, params: &AggregateParams) -> ClientResult<AggregateReport> {
    Ok(report_from_batch(normalize_json(value)?, params))
}

pub(crate) fn report_from_batch(batch: NormalizedBatch, params: &AggregateParams) -> AggregateReport {
    AggregateReport {
        summary: aggregate(&batch.movements, params),
        records_read: batch.records_read,
        records_excluded: batch.records_excluded,
        diagnostics: batch.diagnostics,
    }
}

/// Settled inflow/outflow per category within the period, sorted by
/// category name.
pub fn category_totals(
    movements: &[FinancialMovement],
    period: Option<&DateRange>,
) -> Vec<CategoryTotals> {
    let mut grouped: BTreeMap<String, ByCurrency<FlowTotals>> = BTreeMap::new();
    for movement in movements {
        let Some(effective_date) = movement.effective_date else {
            continue;
        };
        if !in_period(period, Some(effective_date)) {
            continue;
        }
        let category = movement
            .category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_string());
        grouped
            .entry(category)
            .or_default()
            .get_mut(movement.currency)
            .add(movement.kind, movement.amount);
    }

    grouped
        .into_iter()
        .map(|(category, totals)| CategoryTotals { category, totals })
        .collect()
}

fn in_period(period: Option<&DateRange>, date: Option<NaiveDate>) -> bool {
    match (period, date) {
        (None, _) => true,
        (Some(window), Some(value)) => window.contains(value),
        (Some(_), None) => false,
    }
}

fn sort_records(records: &mut [FinancialMovement]) {
    records.sort_by(|left, right| {
        left.reference_date()
            .cmp(&right.reference_date())
            .then_with(|| left.id.cmp(&right.id))
    });
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use serde_json::json;

    use super::{AggregateParams, aggregate, aggregate_json, category_totals};
    use crate::ledger::date::DateRange;
    use crate::ledger::rates::{ExchangeRate, RateStatus};
    use crate::ledger::types::{Currency, FinancialMovement, MovementKind, PaymentMethod};

    fn date(value: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
    }

    fn movement(
        id: &str,
        kind: MovementKind,
        currency: Currency,
        method: PaymentMethod,
        amount: i64,
        expected: &str,
        effective: Option<&str>,
    ) -> FinancialMovement {
        FinancialMovement {
            id: id.to_string(),
            kind,
            payment_method: method,
            currency,
            amount: Decimal::new(amount, 0),
            expected_date: date(expected),
            effective_date: effective.and_then(date),
            category: None,
            subcategory: None,
            detail: None,
            client_ref: None,
            provider_ref: None,
            event_ref: None,
            team_member_ref: None,
        }
    }

    fn params(as_of: &str, period: Option<(&str, &str)>) -> Option<AggregateParams> {
        let as_of = date(as_of)?;
        let period = match period {
            Some((start, end)) => Some(DateRange::new(date(start)?, date(end)?)?),
            None => None,
        };
        Some(AggregateParams {
            period,
            as_of,
            exchange_rate: None,
        })
    }

    #[test]
    fn period_totals_split_by_method_and_currency() {
        let movements = vec![
            movement(
                "a",
                MovementKind::Inflow,
                Currency::Local,
                PaymentMethod::Cash,
                100,
                "2024-01-02",
                Some("2024-01-02"),
            ),
            movement(
                "b",
                MovementKind::Outflow,
                Currency::Foreign,
                PaymentMethod::WireTransfer,
                30,
                "2024-01-03",
                Some("2024-01-31"),
            ),
            movement(
                "c",
                MovementKind::Inflow,
                Currency::Local,
                PaymentMethod::Cash,
                999,
                "2024-02-01",
                Some("2024-02-01"),
            ),
        ];
        let parameters = params("2024-02-15", Some(("2024-01-01", "2024-01-31")));
        assert!(parameters.is_some());
        if let Some(parameters) = parameters {
            let summary = aggregate(&movements, &parameters);
            assert_eq!(summary.period_totals.cash.local.inflow, Decimal::new(100, 0));
            assert_eq!(
                summary.period_totals.wire_transfer.foreign.outflow,
                Decimal::new(30, 0)
            );
            assert_eq!(summary.period_totals.total.local.inflow, Decimal::new(100, 0));
            assert_eq!(summary.cumulative_balance.cash.local, Decimal::new(1099, 0));
            assert_eq!(summary.cumulative_balance.total.foreign, Decimal::new(-30, 0));
            assert_eq!(summary.settled_records.len(), 3);
        }
    }

    #[test]
    fn settled_after_as_of_is_ignored_by_balance() {
        let movements = vec![movement(
            "late",
            MovementKind::Inflow,
            Currency::Local,
            PaymentMethod::Other,
            70,
            "2024-01-01",
            Some("2024-03-01"),
        )];
        let parameters = params("2024-02-29", None);
        assert!(parameters.is_some());
        if let Some(parameters) = parameters {
            let summary = aggregate(&movements, &parameters);
            assert_eq!(summary.cumulative_balance.total.local, Decimal::ZERO);
            assert!(summary.settled_records.is_empty());
            assert_eq!(summary.period_totals.other.local.inflow, Decimal::new(70, 0));
        }
    }

    #[test]
    fn pending_uses_expected_date_for_period_membership() {
        let movements = vec![
            movement(
                "in-window",
                MovementKind::Outflow,
                Currency::Foreign,
                PaymentMethod::Cash,
                10,
                "2024-01-20",
                None,
            ),
            movement(
                "next-month",
                MovementKind::Outflow,
                Currency::Foreign,
                PaymentMethod::Cash,
                15,
                "2024-02-20",
                None,
            ),
        ];
        let parameters = params("2024-01-31", Some(("2024-01-01", "2024-01-31")));
        assert!(parameters.is_some());
        if let Some(parameters) = parameters {
            let summary = aggregate(&movements, &parameters);
            assert_eq!(summary.pending_totals.outflow.foreign, Decimal::new(10, 0));
            assert_eq!(summary.pending_totals.count, 1);
            assert_eq!(summary.pending_records[0].id, "in-window");
        }
    }

    #[test]
    fn pending_local_equivalent_applies_rate_by_kind() {
        let movements = vec![
            movement(
                "usd-in",
                MovementKind::Inflow,
                Currency::Foreign,
                PaymentMethod::WireTransfer,
                10,
                "2024-01-10",
                None,
            ),
            movement(
                "usd-out",
                MovementKind::Outflow,
                Currency::Foreign,
                PaymentMethod::WireTransfer,
                2,
                "2024-01-10",
                None,
            ),
            movement(
                "ars-in",
                MovementKind::Inflow,
                Currency::Local,
                PaymentMethod::Cash,
                500,
                "2024-01-10",
                None,
            ),
        ];
        let parameters = params("2024-01-31", None);
        assert!(parameters.is_some());
        if let Some(mut parameters) = parameters {
            parameters.exchange_rate =
                ExchangeRate::new(Decimal::new(1000, 0), Decimal::new(1100, 0));
            let summary = aggregate(&movements, &parameters);
            let equivalent = summary.pending_totals.local_equivalent;
            assert_eq!(equivalent.rate_status, RateStatus::Applied);
            assert_eq!(equivalent.inflow, Decimal::new(10_500, 0));
            assert_eq!(equivalent.outflow, Decimal::new(2_200, 0));
            assert_eq!(equivalent.net, Decimal::new(8_300, 0));
        }
    }

    #[test]
    fn category_totals_group_settled_records_in_period() {
        let mut catering = movement(
            "a",
            MovementKind::Outflow,
            Currency::Local,
            PaymentMethod::Cash,
            40,
            "2024-01-05",
            Some("2024-01-05"),
        );
        catering.category = Some("catering".to_string());
        let uncategorized = movement(
            "b",
            MovementKind::Inflow,
            Currency::Local,
            PaymentMethod::Cash,
            60,
            "2024-01-06",
            Some("2024-01-06"),
        );
        let window = date("2024-01-01")
            .zip(date("2024-01-31"))
            .and_then(|(start, end)| DateRange::new(start, end));
        assert!(window.is_some());
        let totals = category_totals(&[catering, uncategorized], window.as_ref());
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category, "catering");
        assert_eq!(totals[0].totals.local.outflow, Decimal::new(40, 0));
        assert_eq!(totals[1].category, "uncategorized");
    }

    #[test]
    fn scenario_balance_and_pending_exposure() {
        let movements = vec![
            movement(
                "m1",
                MovementKind::Inflow,
                Currency::Local,
                PaymentMethod::Cash,
                1000,
                "2024-01-05",
                Some("2024-01-05"),
            ),
            movement(
                "m2",
                MovementKind::Outflow,
                Currency::Local,
                PaymentMethod::Cash,
                400,
                "2024-01-10",
                Some("2024-01-10"),
            ),
            movement(
                "m3",
                MovementKind::Inflow,
                Currency::Foreign,
                PaymentMethod::WireTransfer,
                50,
                "2024-01-20",
                None,
            ),
        ];
        let parameters = params("2024-01-31", None);
        assert!(parameters.is_some());
        if let Some(parameters) = parameters {
            let summary = aggregate(&movements, &parameters);
            assert_eq!(summary.cumulative_balance.cash.local, Decimal::new(600, 0));
            assert_eq!(summary.cumulative_balance.total.local, Decimal::new(600, 0));
            assert_eq!(summary.pending_totals.inflow.foreign, Decimal::new(50, 0));
            assert_eq!(summary.pending_records.len(), 1);
            assert_eq!(
                summary.pending_totals.local_equivalent.rate_status,
                RateStatus::UnitFallback
            );
        }
    }

    #[test]
    fn empty_input_yields_zero_totals() {
        let parameters = params("2024-01-31", Some(("2024-01-01", "2024-01-31")));
        assert!(parameters.is_some());
        if let Some(parameters) = parameters {
            let summary = aggregate(&[], &parameters);
            assert_eq!(summary.period_totals, Default::default());
            assert_eq!(summary.cumulative_balance, Default::default());
            assert_eq!(summary.pending_totals.inflow, Default::default());
            assert_eq!(summary.pending_totals.outflow, Default::default());
            assert_eq!(summary.pending_totals.local_equivalent.net, Decimal::ZERO);
            assert!(summary.settled_records.is_empty());
            assert!(summary.pending_records.is_empty());
        }
    }

    #[test]
    fn single_movement_sign_follows_kind() {
        let parameters = params("2024-01-31", None);
        assert!(parameters.is_some());
        if let Some(parameters) = parameters {
            for (kind, expected) in [
                (MovementKind::Inflow, Decimal::new(250, 0)),
                (MovementKind::Outflow, Decimal::new(-250, 0)),
            ] {
                let single = movement(
                    "only",
                    kind,
                    Currency::Foreign,
                    PaymentMethod::Other,
                    250,
                    "2024-01-02",
                    Some("2024-01-02"),
                );
                let summary = aggregate(&[single], &parameters);
                assert_eq!(summary.cumulative_balance.total.foreign, expected);
            }
        }
    }

    #[test]
    fn pending_records_never_touch_balances() {
        let pending = movement(
            "p",
            MovementKind::Inflow,
            Currency::Local,
            PaymentMethod::Cash,
            900,
            "2024-01-15",
            None,
        );
        let parameters = params("2024-01-31", Some(("2024-01-01", "2024-01-31")));
        assert!(parameters.is_some());
        if let Some(parameters) = parameters {
            let summary = aggregate(&[pending], &parameters);
            assert_eq!(summary.cumulative_balance, Default::default());
            assert_eq!(summary.period_totals, Default::default());
            assert_eq!(summary.pending_totals.inflow.local, Decimal::new(900, 0));
            assert!(summary.settled_records.is_empty());
        }
    }

    #[test]
    fn as_of_and_period_end_are_inclusive() {
        let on_boundary = movement(
            "edge",
            MovementKind::Inflow,
            Currency::Local,
            PaymentMethod::Cash,
            5,
            "2024-01-31",
            Some("2024-01-31"),
        );
        let parameters = params("2024-01-31", Some(("2024-01-01", "2024-01-31")));
        assert!(parameters.is_some());
        if let Some(parameters) = parameters {
            let summary = aggregate(&[on_boundary], &parameters);
            assert_eq!(summary.cumulative_balance.total.local, Decimal::new(5, 0));
            assert_eq!(summary.period_totals.total.local.inflow, Decimal::new(5, 0));
        }
    }

    #[test]
    fn permutations_produce_identical_summaries() {
        let mut movements = Vec::new();
        for index in 0..6_i64 {
            let kind = if index % 2 == 0 {
                MovementKind::Inflow
            } else {
                MovementKind::Outflow
            };
            let effective = if index == 5 { None } else { Some("2024-01-10") };
            movements.push(movement(
                &format!("m{index}"),
                kind,
                Currency::Local,
                PaymentMethod::Cash,
                10 * (index + 1),
                "2024-01-10",
                effective,
            ));
        }
        let parameters = params("2024-01-31", None);
        assert!(parameters.is_some());
        if let Some(parameters) = parameters {
            let baseline = aggregate(&movements, &parameters);
            let mut reversed = movements.clone();
            reversed.reverse();
            assert_eq!(aggregate(&reversed, &parameters), baseline);
            movements.rotate_left(2);
            assert_eq!(aggregate(&movements, &parameters), baseline);
        }
    }

    #[test]
    fn unrecognized_currency_does_not_disturb_other_totals() {
        let mut records = vec![json!({
            "id": "bad",
            "tipo": "cobro",
            "metodoPago": "efectivo",
            "moneda": "eur",
            "monto": 5000,
            "fechaEsperado": "2024-01-02",
            "fechaEfectuado": "2024-01-02"
        })];
        for index in 0..9 {
            records.push(json!({
                "id": format!("ok{index}"),
                "tipo": "cobro",
                "metodoPago": "efectivo",
                "moneda": "ars",
                "monto": 100,
                "fechaEsperado": "2024-01-02",
                "fechaEfectuado": "2024-01-02"
            }));
        }
        let parameters = params("2024-01-31", None);
        assert!(parameters.is_some());
        if let Some(parameters) = parameters {
            let with_bad = aggregate_json(&json!(records), &parameters);
            let only_valid = aggregate_json(&json!(records[1..].to_vec()), &parameters);
            assert!(with_bad.is_ok() && only_valid.is_ok());
            if let (Ok(with_bad), Ok(only_valid)) = (with_bad, only_valid) {
                assert_eq!(with_bad.summary, only_valid.summary);
                assert_eq!(with_bad.records_excluded, 1);
                assert_eq!(
                    with_bad.summary.cumulative_balance.total.local,
                    Decimal::new(900, 0)
                );
            }
        }
    }
}
