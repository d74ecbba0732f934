use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::types::{Currency, MovementKind};

/// Quoted foreign-currency rate in local units: `buy` (compra) and `sell`
/// (venta).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExchangeRate {
    pub buy: Decimal,
    pub sell: Decimal,
}

impl ExchangeRate {
    pub fn new(buy: Decimal, sell: Decimal) -> Option<Self> {
        if buy <= Decimal::ZERO || sell <= Decimal::ZERO {
            return None;
        }
        Some(Self { buy, sell })
    }

    /// Foreign money coming in is valued at the buy quote, money going out
    /// at the sell quote.
    pub fn rate_for(&self, kind: MovementKind) -> Decimal {
        match kind {
            MovementKind::Inflow => self.buy,
            MovementKind::Outflow => self.sell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateStatus {
    Applied,
    /// No rate was available; foreign amounts were counted one-to-one.
    UnitFallback,
}

impl RateStatus {
    pub fn for_rate(rate: Option<&ExchangeRate>) -> Self {
        if rate.is_some() {
            Self::Applied
        } else {
            Self::UnitFallback
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::UnitFallback => "unit_fallback",
        }
    }

    pub const fn is_approximate(self) -> bool {
        matches!(self, Self::UnitFallback)
    }
}

pub fn to_local(
    amount: Decimal,
    currency: Currency,
    kind: MovementKind,
    rate: Option<&ExchangeRate>,
) -> Decimal {
    match currency {
        Currency::Local => amount,
        Currency::Foreign => match rate {
            Some(quote) => amount * quote.rate_for(kind),
            None => amount,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalEquivalent {
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub net: Decimal,
    pub rate_status: RateStatus,
}

impl LocalEquivalent {
    pub fn empty(rate: Option<&ExchangeRate>) -> Self {
        Self {
            inflow: Decimal::ZERO,
            outflow: Decimal::ZERO,
            net: Decimal::ZERO,
            rate_status: RateStatus::for_rate(rate),
        }
    }

    pub fn add(&mut self, kind: MovementKind, local_amount: Decimal) {
        match kind {
            MovementKind::Inflow => self.inflow += local_amount,
            MovementKind::Outflow => self.outflow += local_amount,
        }
        self.net = self.inflow - self.outflow;
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{ExchangeRate, RateStatus, to_local};
    use crate::ledger::types::{Currency, MovementKind};

    #[test]
    fn inflows_use_buy_and_outflows_use_sell() {
        let rate = ExchangeRate::new(Decimal::new(1000, 0), Decimal::new(1050, 0));
        assert!(rate.is_some());
        if let Some(quote) = rate {
            let fifty = Decimal::new(50, 0);
            assert_eq!(
                to_local(fifty, Currency::Foreign, MovementKind::Inflow, Some(&quote)),
                Decimal::new(50_000, 0)
            );
            assert_eq!(
                to_local(fifty, Currency::Foreign, MovementKind::Outflow, Some(&quote)),
                Decimal::new(52_500, 0)
            );
            assert_eq!(
                to_local(fifty, Currency::Local, MovementKind::Outflow, Some(&quote)),
                fifty
            );
        }
    }

    #[test]
    fn missing_rate_counts_foreign_one_to_one() {
        let fifty = Decimal::new(50, 0);
        assert_eq!(
            to_local(fifty, Currency::Foreign, MovementKind::Inflow, None),
            fifty
        );
        assert_eq!(RateStatus::for_rate(None), RateStatus::UnitFallback);
        assert!(RateStatus::UnitFallback.is_approximate());
    }

    #[test]
    fn non_positive_quotes_are_rejected() {
        assert!(ExchangeRate::new(Decimal::ZERO, Decimal::ONE).is_none());
        assert!(ExchangeRate::new(Decimal::ONE, Decimal::new(-1, 0)).is_none());
    }
}
