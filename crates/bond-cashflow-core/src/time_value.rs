use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::error::BondCashflowError;
use crate::types::{Money, Rate};
use crate::BondCashflowResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Net Present Value of a series of cash flows, the first undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> BondCashflowResult<Money> {
    if rate <= dec!(-1) {
        return Err(BondCashflowError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            match discount.checked_mul(one_plus_r) {
                Some(next) => discount = next,
                // Remaining terms are below Decimal resolution.
                None => break,
            }
        }
        result += cf
            .checked_div(discount)
            .ok_or_else(|| BondCashflowError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            })?;
    }

    Ok(result)
}

/// Internal Rate of Return using Newton-Raphson.
///
/// Discount factors are accumulated by repeated multiplication. When a trial
/// rate pushes the arithmetic outside Decimal range the step is halved back
/// towards the last rate that evaluated cleanly.
pub fn irr(cash_flows: &[Money], guess: Rate) -> BondCashflowResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(BondCashflowError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let mut rate = guess;
    let mut last_good = guess;
    let mut last_npv = Decimal::MAX;

    for i in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = match npv_with_derivative(cash_flows, rate) {
            Some(values) => values,
            None => {
                debug!(iteration = i, %rate, "IRR trial rate overflowed, damping step");
                rate = (rate + last_good) / dec!(2);
                continue;
            }
        };
        last_good = rate;
        last_npv = npv_val;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            debug!(iterations = i, %rate, "IRR converged");
            return Ok(rate);
        }

        let Some(step) = npv_val.checked_div(dnpv) else {
            return Err(BondCashflowError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        };

        rate -= step;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(100.0) {
            rate = dec!(100.0);
        }
    }

    Err(BondCashflowError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: last_npv,
    })
}

/// NPV and dNPV/dr at `rate`, or `None` if the evaluation leaves Decimal range.
fn npv_with_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            match discount.checked_mul(one_plus_r) {
                Some(next) => discount = next,
                None => break,
            }
        }
        let pv = cf.checked_div(discount)?;
        npv_val = npv_val.checked_add(pv)?;
        if t > 0 {
            let t_dec = Decimal::from(t as u64);
            let slope = t_dec.checked_mul(pv)?.checked_div(one_plus_r)?;
            dnpv = dnpv.checked_sub(slope)?;
        }
    }

    Some((npv_val, dnpv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_one() {
        let cfs = vec![dec!(-100), dec!(110)];
        assert!(npv(dec!(-1), &cfs).is_err());
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_par_bond_equals_coupon() {
        // 4 semi-annual periods of a 5% bond bought at par
        let cfs = vec![dec!(-1000), dec!(25), dec!(25), dec!(25), dec!(1025)];
        let result = irr(&cfs, dec!(0.01)).unwrap();
        assert!((result - dec!(0.025)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_irr_zeroes_npv() {
        let cfs = vec![dec!(-950), dec!(30), dec!(30), dec!(30), dec!(1030)];
        let rate = irr(&cfs, dec!(0.03)).unwrap();
        assert!(npv(rate, &cfs).unwrap().abs() < dec!(0.000001));
    }

    #[test]
    fn test_irr_insufficient_flows() {
        let result = irr(&[dec!(-100)], dec!(0.1));
        assert!(matches!(
            result,
            Err(BondCashflowError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_irr_no_sign_change_fails_explicitly() {
        // All-positive flows have no root; the solver must report it.
        let cfs = vec![dec!(100), dec!(100), dec!(100)];
        let result = irr(&cfs, dec!(0.1));
        assert!(matches!(
            result,
            Err(BondCashflowError::ConvergenceFailure { .. })
        ));
    }
}
