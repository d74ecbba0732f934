use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Inflow,
    Outflow,
}

impl MovementKind {
    pub const ALL: [Self; 2] = [Self::Inflow, Self::Outflow];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
        }
    }

    /// Accepts canonical names and the backend's `cobro` / `pago`.
    pub fn parse(value: &str) -> Option<Self> {
        match canonical_token(value).as_str() {
            "inflow" | "cobro" | "in" => Some(Self::Inflow),
            "outflow" | "pago" | "out" => Some(Self::Outflow),
            _ => None,
        }
    }

    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Inflow => amount,
            Self::Outflow => -amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    WireTransfer,
    Other,
}

impl PaymentMethod {
    pub const ALL: [Self; 3] = [Self::Cash, Self::WireTransfer, Self::Other];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::WireTransfer => "wire_transfer",
            Self::Other => "other",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::WireTransfer => "Wire transfer",
            Self::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match canonical_token(value).as_str() {
            "cash" | "efectivo" => Some(Self::Cash),
            "wire_transfer" | "wiretransfer" | "transfer" | "transferencia" => {
                Some(Self::WireTransfer)
            }
            "other" | "otro" | "otros" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Local,
    Foreign,
}

impl Currency {
    pub const ALL: [Self; 2] = [Self::Local, Self::Foreign];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Foreign => "foreign",
        }
    }

    pub const fn iso_code(self) -> &'static str {
        match self {
            Self::Local => "ARS",
            Self::Foreign => "USD",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match canonical_token(value).as_str() {
            "local" | "ars" => Some(Self::Local),
            "foreign" | "usd" => Some(Self::Foreign),
            _ => None,
        }
    }
}

/// Lower-cases, trims and folds camelCase / dashes / spaces into snake_case
/// so `wireTransfer`, `wire-transfer` and `WIRE TRANSFER` compare equal.
fn canonical_token(value: &str) -> String {
    let mut output = String::with_capacity(value.len() + 2);
    let mut previous_lower = false;
    for character in value.trim().chars() {
        if character == '-' || character == ' ' || character == '_' {
            if !output.ends_with('_') && !output.is_empty() {
                output.push('_');
            }
            previous_lower = false;
            continue;
        }
        if character.is_uppercase() && previous_lower {
            output.push('_');
        }
        previous_lower = character.is_lowercase();
        output.extend(character.to_lowercase());
    }
    output.trim_end_matches('_').to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinancialMovement {
    pub id: String,
    pub kind: MovementKind,
    pub payment_method: PaymentMethod,
    pub currency: Currency,
    pub amount: Decimal,
    pub expected_date: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub detail: Option<String>,
    pub client_ref: Option<String>,
    pub provider_ref: Option<String>,
    pub event_ref: Option<String>,
    pub team_member_ref: Option<String>,
}

impl FinancialMovement {
    pub fn is_pending(&self) -> bool {
        self.effective_date.is_none()
    }

    /// Date used for ordering: the effective date when settled, else the
    /// expected date.
    pub fn reference_date(&self) -> Option<NaiveDate> {
        self.effective_date.or(self.expected_date)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ByCurrency<T> {
    pub local: T,
    pub foreign: T,
}

impl<T> ByCurrency<T> {
    pub fn get(&self, currency: Currency) -> &T {
        match currency {
            Currency::Local => &self.local,
            Currency::Foreign => &self.foreign,
        }
    }

    pub fn get_mut(&mut self, currency: Currency) -> &mut T {
        match currency {
            Currency::Local => &mut self.local,
            Currency::Foreign => &mut self.foreign,
        }
    }
}

/// One bucket per payment method plus a method-independent `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MethodBreakdown<T> {
    pub cash: T,
    pub wire_transfer: T,
    pub other: T,
    pub total: T,
}

impl<T> MethodBreakdown<T> {
    pub fn method(&self, method: PaymentMethod) -> &T {
        match method {
            PaymentMethod::Cash => &self.cash,
            PaymentMethod::WireTransfer => &self.wire_transfer,
            PaymentMethod::Other => &self.other,
        }
    }

    pub fn method_mut(&mut self, method: PaymentMethod) -> &mut T {
        match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::WireTransfer => &mut self.wire_transfer,
            PaymentMethod::Other => &mut self.other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlowTotals {
    pub inflow: Decimal,
    pub outflow: Decimal,
}

impl FlowTotals {
    pub fn add(&mut self, kind: MovementKind, amount: Decimal) {
        match kind {
            MovementKind::Inflow => self.inflow += amount,
            MovementKind::Outflow => self.outflow += amount,
        }
    }

    pub fn net(&self) -> Decimal {
        self.inflow - self.outflow
    }
}
