//! Reconstruction of a loan's position from its outstanding balance, and the payment
//! comparison schedule shown against a counter-offer.
//!
//! Loans are assumed to follow the Price table (fixed installments):
//!
//! ```text
//! PMT        = P * [i(1 + i)^n] / [(1 + i)^n - 1]
//! balance(k) = P * (1 + i)^k - PMT * [(1 + i)^k - 1] / i
//! ```
//!
//! Both are evaluated in their discounted form (powers of `(1 + i)^-1`), so long terms at high
//! rates shrink toward zero instead of leaving the decimal range.
//!
//! Finding `k` from a balance is done by scanning, not by inverting the formula, and the result
//! is an approximation: the first `k` whose projected balance lands inside a tolerance band
//! around the observed balance.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{FinancingError, FinancingResult};
use crate::model::{round_money, Money, OfferRecord, Rate};

/// Relative band around the observed balance accepted as a match.
pub const TOLERANCE_BAND: Decimal = dec!(0.05);

/// Share of the term assumed elapsed when no period matches the band.
pub const FALLBACK_RATIO: Decimal = dec!(0.4);

/// Tuning of the elapsed-period search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub tolerance_band: Decimal,
    pub fallback_ratio: Decimal,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            tolerance_band: TOLERANCE_BAND,
            fallback_ratio: FALLBACK_RATIO,
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> FinancingResult<()> {
        let unit = Decimal::ZERO..=Decimal::ONE;
        if !unit.contains(&self.tolerance_band) {
            return Err(FinancingError::invalid("tolerance_band", "must be within [0, 1]"));
        }
        if !unit.contains(&self.fallback_ratio) {
            return Err(FinancingError::invalid("fallback_ratio", "must be within [0, 1]"));
        }
        Ok(())
    }

    /// Elapsed periods assumed when the search finds nothing.
    pub fn fallback_estimate(&self, term: u32) -> u32 {
        (Decimal::from(term) * self.fallback_ratio)
            .floor()
            .to_u32()
            .unwrap_or_default()
            .min(term)
    }
}

fn validate_loan(principal: Money, rate: Rate, periods: u32) -> FinancingResult<()> {
    if periods == 0 {
        return Err(FinancingError::invalid("term", "must be greater than zero"));
    }
    if principal.is_sign_negative() && !principal.is_zero() {
        return Err(FinancingError::invalid("principal", "cannot be negative"));
    }
    if rate.is_sign_negative() && !rate.is_zero() {
        return Err(FinancingError::invalid("rate", "cannot be negative"));
    }
    Ok(())
}

/// `(1 + rate)^-periods`. The base is at most one, so the power only shrinks; a result below
/// decimal precision reads as zero.
fn discount_factor(rate: Rate, periods: u32) -> FinancingResult<Decimal> {
    let growth = Decimal::ONE
        .checked_add(rate)
        .ok_or_else(|| FinancingError::overflow("discount factor"))?;
    Ok((Decimal::ONE / growth)
        .checked_powu(periods.into())
        .unwrap_or(Decimal::ZERO))
}

/// Fixed installment that repays `principal` over `periods` at `rate` per period.
///
/// Computed in discounted form, `P * i / (1 - (1 + i)^-n)`, which stays in range for any
/// term. A zero rate degenerates to straight division of the principal.
///
/// # Errors
///
/// Returns `InvalidInput` for a zero term or a negative principal or rate, and `Overflow`
/// when `principal * rate` itself exceeds the decimal range.
pub fn periodic_payment(principal: Money, rate: Rate, periods: u32) -> FinancingResult<Money> {
    validate_loan(principal, rate, periods)?;

    let straight = || principal / Decimal::from(periods);
    if rate.is_zero() {
        return Ok(straight());
    }

    let denominator = Decimal::ONE - discount_factor(rate, periods)?;
    // rate too small to register at decimal precision
    if denominator.is_zero() {
        return Ok(straight());
    }

    principal
        .checked_mul(rate)
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| FinancingError::overflow("periodic payment"))
}

/// Balance left after `k` of the `term` fixed installments.
///
/// Uses `P * (1 - (1 + i)^(k - n)) / (1 - (1 + i)^-n)`, which never exceeds the principal.
///
/// # Errors
///
/// Returns `InvalidInput` for an invalid loan or when `k` is past the end of the term.
pub fn balance_after(principal: Money, rate: Rate, term: u32, k: u32) -> FinancingResult<Money> {
    validate_loan(principal, rate, term)?;
    if k > term {
        return Err(FinancingError::invalid("k", "cannot exceed the term"));
    }

    let straight = || principal - principal / Decimal::from(term) * Decimal::from(k);
    if rate.is_zero() {
        return Ok(straight());
    }

    let denominator = Decimal::ONE - discount_factor(rate, term)?;
    if denominator.is_zero() {
        return Ok(straight());
    }

    let outstanding = Decimal::ONE - discount_factor(rate, term - k)?;
    outstanding
        .checked_div(denominator)
        .and_then(|share| principal.checked_mul(share))
        .ok_or_else(|| FinancingError::overflow("balance"))
}

/// `current_balance * factor`, saturating at the decimal range.
fn band_edge(current_balance: Money, factor: Decimal) -> Decimal {
    current_balance.checked_mul(factor).unwrap_or(if current_balance.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

/// Estimates how many installments were already paid, using the default tolerance and
/// fallback.
///
/// # Arguments
///
/// * `principal` - Original financed value.
/// * `rate` - Periodic rate as a fraction.
/// * `term` - Total number of installments.
/// * `current_balance` - Balance observed today.
///
/// # Errors
///
/// Returns `InvalidInput` for a zero term or a negative principal or rate.
pub fn estimate_elapsed_periods(
    principal: Money,
    rate: Rate,
    term: u32,
    current_balance: Money,
) -> FinancingResult<u32> {
    estimate_elapsed_periods_with(&EstimatorConfig::default(), principal, rate, term, current_balance)
}

/// [`estimate_elapsed_periods`] with an explicit configuration.
///
/// Scans `k = 0..=term` in ascending order and returns the first `k` whose projected balance
/// lies within `current_balance * (1 ± tolerance_band)`. When none does, returns
/// `floor(term * fallback_ratio)`. The result is always within `[0, term]`.
pub fn estimate_elapsed_periods_with(
    config: &EstimatorConfig,
    principal: Money,
    rate: Rate,
    term: u32,
    current_balance: Money,
) -> FinancingResult<u32> {
    config.validate()?;
    validate_loan(principal, rate, term)?;

    let lower = band_edge(current_balance, Decimal::ONE - config.tolerance_band);
    let upper = band_edge(current_balance, Decimal::ONE + config.tolerance_band);

    for k in 0..=term {
        let balance = balance_after(principal, rate, term, k)?;
        if balance >= lower && balance <= upper {
            trace!(k, %balance, %current_balance, "elapsed periods matched");
            return Ok(k);
        }
    }

    let fallback = config.fallback_estimate(term);
    debug!(
        term,
        fallback,
        %current_balance,
        "no period matched the tolerance band, using fallback estimate"
    );
    Ok(fallback)
}

/// One installment on the comparison chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePoint {
    /// Installment number, starting at 1.
    pub period: u32,
    pub current_payment: Money,
    /// Absent for installments paid before the counter-offer.
    pub competitor_payment: Option<Money>,
}

impl SchedulePoint {
    pub fn is_projection(&self) -> bool {
        self.competitor_payment.is_some()
    }
}

/// Installments under the current contract against the counter-offer for what remains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSchedule {
    pub term: u32,
    pub elapsed: u32,
    pub remaining: u32,
    pub current_payment: Money,
    /// `None` when nothing remains to refinance.
    pub competitor_payment: Option<Money>,
    /// Difference per installment, rounded to cents.
    pub monthly_savings: Option<Money>,
    /// `monthly_savings` over every remaining installment, rounded to cents.
    pub projected_savings: Money,
    pub points: Vec<SchedulePoint>,
}

impl ComparisonSchedule {
    /// Installments still to be paid after the switch.
    pub fn projection(&self) -> impl Iterator<Item = &SchedulePoint> {
        self.points.iter().filter(|p| p.is_projection())
    }
}

/// Builds the payment comparison for `offer` against `competitor_rate`, with the default
/// estimator configuration.
///
/// The current payment amortizes the original principal over the full term at the offer's rate.
/// The competitor is assumed to refinance the outstanding balance over the remaining
/// installments only.
///
/// # Errors
///
/// Returns `InvalidInput` for a zero term or negative principal, balance or rates.
pub fn build_comparison_schedule(
    offer: &OfferRecord,
    competitor_rate: Rate,
) -> FinancingResult<ComparisonSchedule> {
    build_comparison_schedule_with(&EstimatorConfig::default(), offer, competitor_rate)
}

/// [`build_comparison_schedule`] with an explicit estimator configuration.
pub fn build_comparison_schedule_with(
    config: &EstimatorConfig,
    offer: &OfferRecord,
    competitor_rate: Rate,
) -> FinancingResult<ComparisonSchedule> {
    if competitor_rate.is_sign_negative() && !competitor_rate.is_zero() {
        return Err(FinancingError::invalid("competitor_rate", "cannot be negative"));
    }

    let term = offer.term_periods;
    let elapsed = estimate_elapsed_periods_with(
        config,
        offer.principal_original,
        offer.periodic_rate,
        term,
        offer.outstanding_balance,
    )?;
    let remaining = term - elapsed;

    let current_payment = periodic_payment(offer.principal_original, offer.periodic_rate, term)?;
    let competitor_payment = match remaining {
        0 => None,
        periods => Some(periodic_payment(offer.outstanding_balance, competitor_rate, periods)?),
    };

    let points = (1..=term)
        .map(|period| SchedulePoint {
            period,
            current_payment,
            competitor_payment: if period > elapsed { competitor_payment } else { None },
        })
        .collect();

    let saving = competitor_payment.map(|competitor| current_payment - competitor);
    let projected_savings = saving
        .map(|s| round_money(s * Decimal::from(remaining)))
        .unwrap_or_default();

    Ok(ComparisonSchedule {
        term,
        elapsed,
        remaining,
        current_payment,
        competitor_payment,
        monthly_savings: saving.map(round_money),
        projected_savings,
        points,
    })
}

impl OfferRecord {
    /// Comparison schedule against this offer's own counter-offer rate.
    ///
    /// # Errors
    ///
    /// Returns `NoCounterOffer` when the offer was not covered or carries no competitor rate.
    pub fn comparison_schedule(&self) -> FinancingResult<ComparisonSchedule> {
        match (self.competitively_covered, self.competitor_rate) {
            (true, Some(rate)) => build_comparison_schedule(self, rate),
            _ => Err(FinancingError::NoCounterOffer),
        }
    }
}
