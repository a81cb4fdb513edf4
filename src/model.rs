use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Monetary amounts.
pub type Money = Decimal;

/// Periodic rates as fractions (0.0263 = 2.63% per month), never percentages.
pub type Rate = Decimal;

/// Rounds a monetary figure to cents for display.
pub fn round_money(value: Money) -> Money {
    value.round_dp(2)
}

/// Reporting period of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Period { year, month }
    }

    /// Chart label, e.g. `8/2024`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

/// Kind of asset being financed.
///
/// Automobile loans are tracked as PRICE (fixed installment) contracts and property loans as
/// SAC (constant amortization) contracts. Anything else lands in `Other`, which is counted as an
/// offer but in neither contract bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    Automobile,
    Property,
    #[default]
    #[serde(other)]
    Other,
}

impl LoanType {
    /// Maps free text from upstream; unknown values become `Other`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "automobile" => LoanType::Automobile,
            "property" => LoanType::Property,
            _ => LoanType::Other,
        }
    }
}

/// A third-party credit offer as supplied by the data feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
    pub bank_name: String,
    pub period: Period,
    /// Competitor's monthly rate.
    pub periodic_rate: Rate,
    /// Original financed value of the asset, the amortization base.
    pub principal_original: Money,
    /// Balance still owed today.
    pub outstanding_balance: Money,
    /// Contractual total repayment.
    pub total_value_with_interest: Money,
    pub term_periods: u32,
    pub loan_type: LoanType,
    pub competitively_covered: bool,
    /// Counter-offer rate, present only when `competitively_covered` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_rate: Option<Rate>,
    #[serde(default)]
    pub savings_amount: Money,
}

impl OfferRecord {
    /// Interest still to be paid on the current balance.
    pub fn interest_earned(&self) -> Money {
        self.total_value_with_interest - self.outstanding_balance
    }
}
