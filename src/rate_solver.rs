//! Recovery of the monthly rate implied by an installment.
//!
//! Statements usually show the installment amount but not the rate. For Price table contracts
//! the rate is found by bisection; for SAC contracts it follows directly from the constant
//! amortization.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use tracing::debug;

use crate::amortization::periodic_payment;
use crate::error::{FinancingError, FinancingResult};
use crate::model::{Money, Rate};

/// Accepted gap between the computed and the observed installment.
const PAYMENT_TOLERANCE: Decimal = dec!(0.000001);

const MAX_ITERATIONS: u32 = 100;

/// Converts an annual percentage (e.g. `10.5` for 10.5%) to the equivalent compounded
/// monthly rate as a fraction.
///
/// # Errors
///
/// Returns `InvalidInput` when the rate is at or below -100%.
pub fn annual_to_monthly_rate(annual_percent: Decimal) -> FinancingResult<Rate> {
    let base = Decimal::ONE + annual_percent / dec!(100);
    if base <= Decimal::ZERO {
        return Err(FinancingError::invalid("annual_percent", "must be above -100"));
    }

    base.checked_powd(Decimal::ONE / dec!(12))
        .map(|monthly| monthly - Decimal::ONE)
        .ok_or_else(|| FinancingError::overflow("monthly rate conversion"))
}

/// Monthly rate at which a Price table loan of `total` over `installments` pays
/// `installment_amount`.
///
/// Bisects on `[0, 1]`. If the payment does not converge within the tolerance the midpoint of
/// the final bracket is returned.
///
/// # Errors
///
/// Returns `InvalidInput` when any argument is zero or negative.
pub fn implied_price_rate(
    total: Money,
    installments: u32,
    installment_amount: Money,
) -> FinancingResult<Rate> {
    if installments == 0 {
        return Err(FinancingError::invalid("installments", "must be greater than zero"));
    }
    if total <= Decimal::ZERO {
        return Err(FinancingError::invalid("total", "must be positive"));
    }
    if installment_amount <= Decimal::ZERO {
        return Err(FinancingError::invalid("installment_amount", "must be positive"));
    }

    let mut lower = Decimal::ZERO;
    let mut upper = Decimal::ONE;

    for _ in 0..MAX_ITERATIONS {
        let mid = (lower + upper) / dec!(2);
        let payment = periodic_payment(total, mid, installments)?;

        if (payment - installment_amount).abs() < PAYMENT_TOLERANCE {
            return Ok(mid);
        }

        if payment < installment_amount {
            lower = mid;
        } else {
            upper = mid;
        }
    }

    let rate = (lower + upper) / dec!(2);
    debug!(%rate, "implied price rate did not converge, using bracket midpoint");
    Ok(rate)
}

/// Monthly rate implied by a SAC installment.
///
/// The constant amortization is `total / installments`; the balance carried into installment
/// `current_installment` (1-based) is that amortization times the installments still open,
/// and the rate is the interest share of the installment over that balance.
///
/// # Errors
///
/// Returns `InvalidInput` for a zero term, an installment number outside `1..=installments`,
/// or a balance that is not positive.
pub fn implied_sac_rate(
    total: Money,
    installments: u32,
    current_installment: u32,
    installment_amount: Money,
) -> FinancingResult<Rate> {
    if installments == 0 {
        return Err(FinancingError::invalid("installments", "must be greater than zero"));
    }
    if current_installment == 0 || current_installment > installments {
        return Err(FinancingError::invalid(
            "current_installment",
            "must be between 1 and the number of installments",
        ));
    }

    let amortization = total / Decimal::from(installments);
    let open = installments - current_installment + 1;
    let balance = amortization * Decimal::from(open);

    if balance <= Decimal::ZERO {
        return Err(FinancingError::invalid("total", "balance must be positive"));
    }

    Ok((installment_amount - amortization) / balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_annual_to_monthly_rate() {
        // (1.12)^(1/12) - 1 = 0.009488...
        let monthly = annual_to_monthly_rate(dec!(12)).unwrap();
        assert!(monthly > dec!(0.0094) && monthly < dec!(0.0095));

        assert!(annual_to_monthly_rate(dec!(0)).unwrap().abs() < dec!(0.000000001));
        assert!(annual_to_monthly_rate(dec!(-100)).is_err());
    }

    #[test]
    fn test_implied_price_rate_recovers_known_rate() {
        let payment = periodic_payment(dec!(60000), dec!(0.0263), 48).unwrap();
        let rate = implied_price_rate(dec!(60000), 48, payment).unwrap();
        assert!((rate - dec!(0.0263)).abs() < dec!(0.00000001));
    }

    #[test]
    fn test_implied_price_rate_from_rounded_installment() {
        let rate = implied_price_rate(dec!(12000), 12, dec!(1062.74)).unwrap();
        assert!((rate - dec!(0.0094888)).abs() < dec!(0.00001));
    }

    #[test]
    fn test_implied_price_rate_zero_interest() {
        let rate = implied_price_rate(dec!(12000), 12, dec!(1000)).unwrap();
        assert!(rate < dec!(0.000001));
    }

    #[test]
    fn test_implied_price_rate_long_term_does_not_overflow() {
        let payment = periodic_payment(dec!(360000), dec!(0.0083), 420).unwrap();
        let rate = implied_price_rate(dec!(360000), 420, payment).unwrap();
        assert!((rate - dec!(0.0083)).abs() < dec!(0.00000001));
    }

    #[rstest]
    #[case(dec!(0), 12, dec!(100))]
    #[case(dec!(1000), 0, dec!(100))]
    #[case(dec!(1000), 12, dec!(0))]
    fn test_implied_price_rate_rejects_invalid(
        #[case] total: Money,
        #[case] installments: u32,
        #[case] installment: Money,
    ) {
        assert!(matches!(
            implied_price_rate(total, installments, installment),
            Err(FinancingError::InvalidInput { .. })
        ));
    }

    #[rstest]
    #[case(1, dec!(1120))]
    #[case(7, dec!(1060))]
    #[case(12, dec!(1010))]
    fn test_implied_sac_rate(#[case] current: u32, #[case] installment: Money) {
        let rate = implied_sac_rate(dec!(12000), 12, current, installment).unwrap();
        assert_eq!(rate, dec!(0.01));
    }

    #[rstest]
    #[case(dec!(12000), 0, 1)]
    #[case(dec!(12000), 12, 0)]
    #[case(dec!(12000), 12, 13)]
    #[case(dec!(0), 12, 1)]
    fn test_implied_sac_rate_rejects_invalid(
        #[case] total: Money,
        #[case] installments: u32,
        #[case] current: u32,
    ) {
        assert!(implied_sac_rate(total, installments, current, dec!(100)).is_err());
    }
}
