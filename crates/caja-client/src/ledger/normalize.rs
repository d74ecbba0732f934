use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ledger::date::parse_calendar_date;
use crate::ledger::types::{Currency, FinancialMovement, MovementKind, PaymentMethod};
use crate::{ClientError, ClientResult};

/// A movement as it arrives from the backend, an import file or the store.
/// Every field is loosely typed; both canonical and backend key names are
/// accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMovement {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, alias = "tipo", alias = "type")]
    pub kind: Option<Value>,
    #[serde(default, alias = "metodoPago", alias = "paymentMethod")]
    pub payment_method: Option<Value>,
    #[serde(default, alias = "moneda")]
    pub currency: Option<Value>,
    #[serde(default, alias = "monto")]
    pub amount: Option<Value>,
    #[serde(default, alias = "fechaEsperado", alias = "expectedDate")]
    pub expected_date: Option<Value>,
    #[serde(default, alias = "fechaEfectuado", alias = "effectiveDate")]
    pub effective_date: Option<Value>,
    #[serde(default, alias = "categoria")]
    pub category: Option<Value>,
    #[serde(default, alias = "subcategoria")]
    pub subcategory: Option<Value>,
    #[serde(default, alias = "detalle")]
    pub detail: Option<Value>,
    #[serde(default, alias = "cliente", alias = "client")]
    pub client_ref: Option<Value>,
    #[serde(default, alias = "proveedor", alias = "provider")]
    pub provider_ref: Option<Value>,
    #[serde(default, alias = "evento", alias = "event")]
    pub event_ref: Option<Value>,
    #[serde(default, alias = "miembro", alias = "teamMember")]
    pub team_member_ref: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizeDiagnostic {
    pub record: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub field: String,
    pub code: String,
    pub message: String,
    pub excluded: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub movements: Vec<FinancialMovement>,
    pub diagnostics: Vec<NormalizeDiagnostic>,
    pub records_read: usize,
    pub records_excluded: usize,
}

pub fn normalize_json(value: &Value) -> ClientResult<NormalizedBatch> {
    let Some(items) = value.as_array() else {
        return Err(ClientError::aggregation_input_not_list());
    };

    let mut batch = NormalizedBatch {
        records_read: items.len(),
        ..NormalizedBatch::default()
    };
    for (index, item) in items.iter().enumerate() {
        let record = (index as i64) + 1;
        let parsed = if item.is_object() {
            serde_json::from_value::<RawMovement>(item.clone())
                .map_err(|error| format!("record could not be read: {error}"))
        } else {
            Err("record must be a JSON object".to_string())
        };

        match parsed {
            Ok(raw_movement) => normalize_into(&mut batch, record, &raw_movement),
            Err(message) => {
                push_diagnostic(
                    &mut batch.diagnostics,
                    record,
                    None,
                    "record",
                    "malformed_record",
                    &message,
                    true,
                );
                batch.records_excluded += 1;
            }
        }
    }
    Ok(batch)
}

pub fn normalize_records(raw_records: &[RawMovement]) -> NormalizedBatch {
    let mut batch = NormalizedBatch {
        records_read: raw_records.len(),
        ..NormalizedBatch::default()
    };
    for (index, raw) in raw_records.iter().enumerate() {
        normalize_into(&mut batch, (index as i64) + 1, raw);
    }
    batch
}

fn normalize_into(batch: &mut NormalizedBatch, record: i64, raw: &RawMovement) {
    let id = text_value(raw.id.as_ref());
    let diagnostics_before = batch.diagnostics.len();
    let mut excluded = false;

    let kind = enum_field(
        batch,
        record,
        id.as_deref(),
        "kind",
        raw.kind.as_ref(),
        MovementKind::parse,
        &mut excluded,
    );
    let payment_method = enum_field(
        batch,
        record,
        id.as_deref(),
        "payment_method",
        raw.payment_method.as_ref(),
        PaymentMethod::parse,
        &mut excluded,
    );
    let currency = enum_field(
        batch,
        record,
        id.as_deref(),
        "currency",
        raw.currency.as_ref(),
        Currency::parse,
        &mut excluded,
    );
    let amount = amount_field(batch, record, id.as_deref(), raw.amount.as_ref());
    let expected_date = date_field(
        batch,
        record,
        id.as_deref(),
        "expected_date",
        raw.expected_date.as_ref(),
    );
    let effective_date = date_field(
        batch,
        record,
        id.as_deref(),
        "effective_date",
        raw.effective_date.as_ref(),
    );

    if expected_date.is_none() && !excluded {
        push_diagnostic(
            &mut batch.diagnostics,
            record,
            id.as_deref(),
            "expected_date",
            "expected_date_missing",
            "expected date is missing; the record only counts toward unbounded pending totals",
            false,
        );
    }

    let (Some(kind), Some(payment_method), Some(currency), false) =
        (kind, payment_method, currency, excluded)
    else {
        for diagnostic in &mut batch.diagnostics[diagnostics_before..] {
            diagnostic.excluded = true;
        }
        batch.records_excluded += 1;
        return;
    };

    batch.movements.push(FinancialMovement {
        id: id.unwrap_or_else(|| format!("row_{record}")),
        kind,
        payment_method,
        currency,
        amount,
        expected_date,
        effective_date,
        category: text_value(raw.category.as_ref()),
        subcategory: text_value(raw.subcategory.as_ref()),
        detail: text_value(raw.detail.as_ref()),
        client_ref: text_value(raw.client_ref.as_ref()),
        provider_ref: text_value(raw.provider_ref.as_ref()),
        event_ref: text_value(raw.event_ref.as_ref()),
        team_member_ref: text_value(raw.team_member_ref.as_ref()),
    });
}

fn enum_field<T>(
    batch: &mut NormalizedBatch,
    record: i64,
    id: Option<&str>,
    field: &str,
    value: Option<&Value>,
    parse: fn(&str) -> Option<T>,
    excluded: &mut bool,
) -> Option<T> {
    let Some(text) = text_value(value) else {
        *excluded = true;
        push_diagnostic(
            &mut batch.diagnostics,
            record,
            id,
            field,
            &format!("missing_{field}"),
            &format!("{field} is missing; record excluded from totals"),
            true,
        );
        return None;
    };

    let parsed = parse(&text);
    if parsed.is_none() {
        *excluded = true;
        push_diagnostic(
            &mut batch.diagnostics,
            record,
            id,
            field,
            &format!("unrecognized_{field}"),
            &format!("{field} \"{text}\" is not recognized; record excluded from totals"),
            true,
        );
    }
    parsed
}

fn amount_field(
    batch: &mut NormalizedBatch,
    record: i64,
    id: Option<&str>,
    value: Option<&Value>,
) -> Decimal {
    let Some(text) = text_value(value) else {
        push_diagnostic(
            &mut batch.diagnostics,
            record,
            id,
            "amount",
            "amount_defaulted",
            "amount is missing; counted as 0",
            false,
        );
        return Decimal::ZERO;
    };

    match parse_decimal(&text) {
        Some(amount) if amount.is_sign_negative() && !amount.is_zero() => {
            push_diagnostic(
                &mut batch.diagnostics,
                record,
                id,
                "amount",
                "amount_defaulted",
                &format!("amount \"{text}\" is negative; counted as 0"),
                false,
            );
            Decimal::ZERO
        }
        Some(amount) => amount,
        None => {
            push_diagnostic(
                &mut batch.diagnostics,
                record,
                id,
                "amount",
                "amount_defaulted",
                &format!("amount \"{text}\" is not a number; counted as 0"),
                false,
            );
            Decimal::ZERO
        }
    }
}

fn date_field(
    batch: &mut NormalizedBatch,
    record: i64,
    id: Option<&str>,
    field: &str,
    value: Option<&Value>,
) -> Option<NaiveDate> {
    let text = text_value(value)?;
    let parsed = parse_calendar_date(&text);
    if parsed.is_none() {
        push_diagnostic(
            &mut batch.diagnostics,
            record,
            id,
            field,
            "invalid_date",
            &format!("{field} \"{text}\" is not a valid date; treated as absent"),
            false,
        );
    }
    parsed
}

pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .ok()
        .or_else(|| Decimal::from_scientific(trimmed).ok())
}

fn text_value(value: Option<&Value>) -> Option<String> {
    let current = value?;
    let text = match current {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Some(text)
}

fn push_diagnostic(
    diagnostics: &mut Vec<NormalizeDiagnostic>,
    record: i64,
    id: Option<&str>,
    field: &str,
    code: &str,
    message: &str,
    excluded: bool,
) {
    tracing::warn!(record, id = id.unwrap_or("-"), field, code, "{message}");
    diagnostics.push(NormalizeDiagnostic {
        record,
        id: id.map(str::to_string),
        field: field.to_string(),
        code: code.to_string(),
        message: message.to_string(),
        excluded,
    });
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{normalize_json, parse_decimal};
    use crate::ledger::types::{Currency, MovementKind, PaymentMethod};

    #[test]
    fn backend_shaped_record_is_normalized() {
        let batch = normalize_json(&json!([{
            "id": "abc123",
            "tipo": "cobro",
            "metodoPago": "efectivo",
            "moneda": "ARS",
            "monto": "1500.50",
            "fechaEsperado": "2024-01-05 00:00:00.000Z",
            "fechaEfectuado": null,
            "categoria": "evento"
        }]));
        assert!(batch.is_ok());
        if let Ok(value) = batch {
            assert_eq!(value.movements.len(), 1);
            assert!(value.diagnostics.is_empty());
            let movement = &value.movements[0];
            assert_eq!(movement.id, "abc123");
            assert_eq!(movement.kind, MovementKind::Inflow);
            assert_eq!(movement.payment_method, PaymentMethod::Cash);
            assert_eq!(movement.currency, Currency::Local);
            assert_eq!(movement.amount, Decimal::new(150050, 2));
            assert!(movement.is_pending());
            assert_eq!(movement.category.as_deref(), Some("evento"));
        }
    }

    #[test]
    fn unrecognized_currency_excludes_record_with_diagnostic() {
        let batch = normalize_json(&json!([
            {"id": "a", "kind": "inflow", "payment_method": "cash", "currency": "eur", "amount": 10, "expected_date": "2024-01-01"},
            {"id": "b", "kind": "inflow", "payment_method": "cash", "currency": "local", "amount": 10, "expected_date": "2024-01-01"}
        ]));
        assert!(batch.is_ok());
        if let Ok(value) = batch {
            assert_eq!(value.records_read, 2);
            assert_eq!(value.records_excluded, 1);
            assert_eq!(value.movements.len(), 1);
            assert_eq!(value.movements[0].id, "b");
            assert_eq!(value.diagnostics.len(), 1);
            assert_eq!(value.diagnostics[0].code, "unrecognized_currency");
            assert!(value.diagnostics[0].excluded);
        }
    }

    #[test]
    fn bad_amount_defaults_to_zero_and_keeps_record() {
        let batch = normalize_json(&json!([
            {"kind": "outflow", "payment_method": "other", "currency": "usd", "amount": "abc", "expected_date": "2024-01-01"}
        ]));
        assert!(batch.is_ok());
        if let Ok(value) = batch {
            assert_eq!(value.movements.len(), 1);
            assert_eq!(value.movements[0].amount, Decimal::ZERO);
            assert_eq!(value.movements[0].id, "row_1");
            assert_eq!(value.diagnostics[0].code, "amount_defaulted");
            assert!(!value.diagnostics[0].excluded);
        }
    }

    #[test]
    fn invalid_effective_date_is_treated_as_pending() {
        let batch = normalize_json(&json!([
            {"kind": "inflow", "payment_method": "cash", "currency": "local", "amount": 5, "expected_date": "2024-01-01", "effective_date": "not a date"}
        ]));
        assert!(batch.is_ok());
        if let Ok(value) = batch {
            assert!(value.movements[0].is_pending());
            assert_eq!(value.diagnostics[0].code, "invalid_date");
        }
    }

    #[test]
    fn non_object_entries_are_excluded_but_do_not_abort() {
        let batch = normalize_json(&json!([
            42,
            {"kind": "inflow", "payment_method": "cash", "currency": "local", "amount": 5, "expected_date": "2024-01-01"}
        ]));
        assert!(batch.is_ok());
        if let Ok(value) = batch {
            assert_eq!(value.movements.len(), 1);
            assert_eq!(value.diagnostics[0].code, "malformed_record");
        }
    }

    #[test]
    fn non_list_input_is_a_programmer_error() {
        let result = normalize_json(&json!({"kind": "inflow"}));
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "aggregation_input_not_list");
        }
    }

    #[test]
    fn decimal_parser_accepts_plain_and_scientific_forms() {
        assert_eq!(parse_decimal("12.5"), Some(Decimal::new(125, 1)));
        assert_eq!(parse_decimal("1e3"), Some(Decimal::new(1000, 0)));
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal(""), None);
    }
}
