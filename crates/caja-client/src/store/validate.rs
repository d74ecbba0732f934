use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::contracts::types::FieldIssue;
use crate::ledger::date::looks_like_iso_date;
use crate::ledger::normalize::parse_decimal;
use crate::ledger::rates::ExchangeRate;
use crate::ledger::types::{Currency, FinancialMovement, MovementKind, PaymentMethod};
use crate::{ClientError, ClientResult};

const MAX_AMOUNT_SCALE: u32 = 2;

/// Form-style input for a new movement. Every value arrives as text.
#[derive(Debug, Clone, Default)]
pub struct MovementInput {
    pub kind: Option<String>,
    pub payment_method: Option<String>,
    pub currency: Option<String>,
    pub amount: Option<String>,
    pub expected_date: Option<String>,
    pub effective_date: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub detail: Option<String>,
    pub client_ref: Option<String>,
    pub provider_ref: Option<String>,
    pub event_ref: Option<String>,
    pub team_member_ref: Option<String>,
}

/// Partial update. `None` keeps the stored value; for free-text fields an
/// empty string clears it.
#[derive(Debug, Clone, Default)]
pub struct MovementPatch {
    pub fields: MovementInput,
    pub clear_effective_date: bool,
}

impl MovementPatch {
    pub fn is_empty(&self) -> bool {
        let fields = &self.fields;
        !self.clear_effective_date
            && [
                &fields.kind,
                &fields.payment_method,
                &fields.currency,
                &fields.amount,
                &fields.expected_date,
                &fields.effective_date,
                &fields.category,
                &fields.subcategory,
                &fields.detail,
                &fields.client_ref,
                &fields.provider_ref,
                &fields.event_ref,
                &fields.team_member_ref,
            ]
            .iter()
            .all(|value| value.is_none())
    }
}

pub(crate) fn validate_new(id: String, input: &MovementInput) -> ClientResult<FinancialMovement> {
    let mut issues = Vec::new();

    let kind = required_enum(
        "kind",
        input.kind.as_deref(),
        MovementKind::parse,
        "inflow|outflow",
        &mut issues,
    );
    let payment_method = required_enum(
        "payment_method",
        input.payment_method.as_deref(),
        PaymentMethod::parse,
        "cash|wire_transfer|other",
        &mut issues,
    );
    let currency = required_enum(
        "currency",
        input.currency.as_deref(),
        Currency::parse,
        "local|foreign",
        &mut issues,
    );
    let amount = required_amount(input.amount.as_deref(), &mut issues);
    let expected_date = match normalize_optional(input.expected_date.as_deref()) {
        Some(value) => strict_date("expected_date", &value, &mut issues),
        None => {
            issues.push(missing("expected_date", "YYYY-MM-DD"));
            None
        }
    };
    let effective_date = normalize_optional(input.effective_date.as_deref())
        .and_then(|value| strict_date("effective_date", &value, &mut issues));

    let (Some(kind), Some(payment_method), Some(currency), Some(amount), Some(expected_date)) =
        (kind, payment_method, currency, amount, expected_date)
    else {
        return Err(ClientError::movement_validation_failed(issues));
    };
    if !issues.is_empty() {
        return Err(ClientError::movement_validation_failed(issues));
    }

    Ok(FinancialMovement {
        id,
        kind,
        payment_method,
        currency,
        amount,
        expected_date: Some(expected_date),
        effective_date,
        category: normalize_optional(input.category.as_deref()),
        subcategory: normalize_optional(input.subcategory.as_deref()),
        detail: normalize_optional(input.detail.as_deref()),
        client_ref: normalize_optional(input.client_ref.as_deref()),
        provider_ref: normalize_optional(input.provider_ref.as_deref()),
        event_ref: normalize_optional(input.event_ref.as_deref()),
        team_member_ref: normalize_optional(input.team_member_ref.as_deref()),
    })
}

pub(crate) fn apply_patch(
    existing: &FinancialMovement,
    patch: &MovementPatch,
) -> ClientResult<FinancialMovement> {
    let fields = &patch.fields;
    let mut issues = Vec::new();
    let mut updated = existing.clone();

    if let Some(value) = fields.kind.as_deref()
        && let Some(kind) = required_enum(
            "kind",
            Some(value),
            MovementKind::parse,
            "inflow|outflow",
            &mut issues,
        )
    {
        updated.kind = kind;
    }
    if let Some(value) = fields.payment_method.as_deref()
        && let Some(method) = required_enum(
            "payment_method",
            Some(value),
            PaymentMethod::parse,
            "cash|wire_transfer|other",
            &mut issues,
        )
    {
        updated.payment_method = method;
    }
    if let Some(value) = fields.currency.as_deref()
        && let Some(currency) = required_enum(
            "currency",
            Some(value),
            Currency::parse,
            "local|foreign",
            &mut issues,
        )
    {
        updated.currency = currency;
    }
    if let Some(value) = fields.amount.as_deref()
        && let Some(amount) = required_amount(Some(value), &mut issues)
    {
        updated.amount = amount;
    }
    if let Some(value) = fields.expected_date.as_deref() {
        match normalize_optional(Some(value)) {
            Some(text) => {
                if let Some(date) = strict_date("expected_date", &text, &mut issues) {
                    updated.expected_date = Some(date);
                }
            }
            None => issues.push(missing("expected_date", "YYYY-MM-DD")),
        }
    }

    if patch.clear_effective_date && fields.effective_date.is_some() {
        issues.push(FieldIssue {
            field: "effective_date".to_string(),
            code: "conflicting_fields".to_string(),
            description: "effective_date cannot be set and cleared in the same edit.".to_string(),
            expected: None,
            received: fields.effective_date.clone(),
        });
    } else if patch.clear_effective_date {
        updated.effective_date = None;
    } else if let Some(value) = fields.effective_date.as_deref()
        && let Some(text) = normalize_optional(Some(value))
        && let Some(date) = strict_date("effective_date", &text, &mut issues)
    {
        updated.effective_date = Some(date);
    }

    patch_text(&mut updated.category, fields.category.as_deref());
    patch_text(&mut updated.subcategory, fields.subcategory.as_deref());
    patch_text(&mut updated.detail, fields.detail.as_deref());
    patch_text(&mut updated.client_ref, fields.client_ref.as_deref());
    patch_text(&mut updated.provider_ref, fields.provider_ref.as_deref());
    patch_text(&mut updated.event_ref, fields.event_ref.as_deref());
    patch_text(&mut updated.team_member_ref, fields.team_member_ref.as_deref());

    if !issues.is_empty() {
        return Err(ClientError::movement_validation_failed(issues));
    }
    Ok(updated)
}

pub(crate) fn validate_rate(buy: &str, sell: &str) -> ClientResult<ExchangeRate> {
    let mut issues = Vec::new();
    let buy_value = positive_decimal("buy", buy, &mut issues);
    let sell_value = positive_decimal("sell", sell, &mut issues);

    match (buy_value, sell_value) {
        (Some(buy_value), Some(sell_value)) if issues.is_empty() => {
            ExchangeRate::new(buy_value, sell_value)
                .ok_or_else(|| ClientError::movement_validation_failed(issues))
        }
        _ => Err(ClientError::movement_validation_failed(issues)),
    }
}

fn required_enum<T>(
    field: &str,
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
    accepted: &str,
    issues: &mut Vec<FieldIssue>,
) -> Option<T> {
    let Some(candidate) = normalize_optional(value) else {
        issues.push(missing(field, accepted));
        return None;
    };

    let parsed = parse(&candidate);
    if parsed.is_none() {
        issues.push(FieldIssue {
            field: field.to_string(),
            code: "unrecognized_value".to_string(),
            description: format!("{field} must be one of {accepted}; got \"{candidate}\""),
            expected: Some(accepted.to_string()),
            received: Some(candidate),
        });
    }
    parsed
}

fn required_amount(value: Option<&str>, issues: &mut Vec<FieldIssue>) -> Option<Decimal> {
    let Some(candidate) = normalize_optional(value) else {
        issues.push(missing("amount", "positive number"));
        return None;
    };
    let amount = positive_decimal("amount", &candidate, issues)?;

    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        issues.push(FieldIssue {
            field: "amount".to_string(),
            code: "invalid_amount_scale".to_string(),
            description: format!(
                "amount must use at most {MAX_AMOUNT_SCALE} decimal places; got \"{candidate}\""
            ),
            expected: Some("number with <= 2 decimal places (e.g. 1500.50)".to_string()),
            received: Some(candidate),
        });
        return None;
    }
    Some(amount)
}

fn positive_decimal(field: &str, candidate: &str, issues: &mut Vec<FieldIssue>) -> Option<Decimal> {
    let Some(parsed) = parse_decimal(candidate) else {
        issues.push(FieldIssue {
            field: field.to_string(),
            code: "invalid_number".to_string(),
            description: format!("{field} must be numeric; got \"{}\"", candidate.trim()),
            expected: Some("positive number".to_string()),
            received: Some(candidate.trim().to_string()),
        });
        return None;
    };

    if parsed <= Decimal::ZERO {
        issues.push(FieldIssue {
            field: field.to_string(),
            code: "non_positive_amount".to_string(),
            description: format!("{field} must be greater than zero; got \"{}\"", candidate.trim()),
            expected: Some("positive number".to_string()),
            received: Some(candidate.trim().to_string()),
        });
        return None;
    }
    Some(parsed)
}

fn strict_date(field: &str, candidate: &str, issues: &mut Vec<FieldIssue>) -> Option<NaiveDate> {
    let parsed = if looks_like_iso_date(candidate) {
        NaiveDate::parse_from_str(candidate, "%Y-%m-%d").ok()
    } else {
        None
    };

    if parsed.is_none() {
        issues.push(FieldIssue {
            field: field.to_string(),
            code: "invalid_date".to_string(),
            description: format!("{field} must be a real calendar date in YYYY-MM-DD; got \"{candidate}\""),
            expected: Some("YYYY-MM-DD".to_string()),
            received: Some(candidate.to_string()),
        });
    }
    parsed
}

fn missing(field: &str, expected: &str) -> FieldIssue {
    FieldIssue {
        field: field.to_string(),
        code: "missing_required_field".to_string(),
        description: format!("{field} must be present and non-empty."),
        expected: Some(expected.to_string()),
        received: Some(String::new()),
    }
}

fn patch_text(target: &mut Option<String>, value: Option<&str>) {
    if let Some(raw) = value {
        *target = normalize_optional(Some(raw));
    }
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{MovementInput, MovementPatch, apply_patch, validate_new, validate_rate};
    use crate::ledger::types::{MovementKind, PaymentMethod};

    fn valid_input() -> MovementInput {
        MovementInput {
            kind: Some("cobro".to_string()),
            payment_method: Some("transferencia".to_string()),
            currency: Some("usd".to_string()),
            amount: Some("1500.50".to_string()),
            expected_date: Some("2024-03-01".to_string()),
            category: Some("  evento ".to_string()),
            ..MovementInput::default()
        }
    }

    fn issue_codes(error: &crate::ClientError) -> Vec<String> {
        error
            .data
            .as_ref()
            .and_then(|data| data.get("issues"))
            .and_then(|issues| issues.as_array())
            .map(|issues| {
                issues
                    .iter()
                    .filter_map(|issue| issue.get("code").and_then(|code| code.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn valid_input_becomes_pending_movement() {
        let result = validate_new("mov_1".to_string(), &valid_input());
        assert!(result.is_ok());
        if let Ok(movement) = result {
            assert_eq!(movement.kind, MovementKind::Inflow);
            assert_eq!(movement.payment_method, PaymentMethod::WireTransfer);
            assert_eq!(movement.amount, Decimal::new(150050, 2));
            assert!(movement.is_pending());
            assert_eq!(movement.category.as_deref(), Some("evento"));
        }
    }

    #[test]
    fn every_bad_field_is_reported_at_once() {
        let input = MovementInput {
            kind: Some("transfer".to_string()),
            payment_method: None,
            currency: Some("eur".to_string()),
            amount: Some("-3".to_string()),
            expected_date: Some("2024-02-30".to_string()),
            ..MovementInput::default()
        };
        let result = validate_new("mov_1".to_string(), &input);
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "movement_validation_failed");
            assert_eq!(
                issue_codes(&error),
                vec![
                    "unrecognized_value",
                    "missing_required_field",
                    "unrecognized_value",
                    "non_positive_amount",
                    "invalid_date",
                ]
            );
        }
    }

    #[test]
    fn amounts_with_more_than_two_decimals_are_rejected() {
        let mut input = valid_input();
        input.amount = Some("10.125".to_string());
        let result = validate_new("mov_1".to_string(), &input);
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(issue_codes(&error), vec!["invalid_amount_scale"]);
        }

        input.amount = Some("10.500".to_string());
        assert!(validate_new("mov_1".to_string(), &input).is_ok());
    }

    #[test]
    fn patch_updates_only_given_fields_and_clears_text() {
        let created = validate_new("mov_1".to_string(), &valid_input());
        assert!(created.is_ok());
        if let Ok(existing) = created {
            let patch = MovementPatch {
                fields: MovementInput {
                    amount: Some("20".to_string()),
                    effective_date: Some("2024-03-02".to_string()),
                    category: Some(String::new()),
                    ..MovementInput::default()
                },
                clear_effective_date: false,
            };
            let updated = apply_patch(&existing, &patch);
            assert!(updated.is_ok());
            if let Ok(movement) = updated {
                assert_eq!(movement.amount, Decimal::new(20, 0));
                assert_eq!(movement.effective_date, NaiveDate::from_ymd_opt(2024, 3, 2));
                assert_eq!(movement.category, None);
                assert_eq!(movement.kind, existing.kind);
            }
        }
    }

    #[test]
    fn patch_cannot_set_and_clear_effective_date() {
        let created = validate_new("mov_1".to_string(), &valid_input());
        assert!(created.is_ok());
        if let Ok(existing) = created {
            let patch = MovementPatch {
                fields: MovementInput {
                    effective_date: Some("2024-03-02".to_string()),
                    ..MovementInput::default()
                },
                clear_effective_date: true,
            };
            assert!(apply_patch(&existing, &patch).is_err());
            assert!(!patch.is_empty());
            assert!(MovementPatch::default().is_empty());
        }
    }

    #[test]
    fn rate_quotes_must_be_positive_numbers() {
        assert!(validate_rate("1000", "1050.5").is_ok());
        assert!(validate_rate("0", "1050").is_err());
        assert!(validate_rate("abc", "1050").is_err());
    }
}
