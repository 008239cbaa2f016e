use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bond::schedule::CashFlowSchedule;
use crate::bond::terms::BondTerms;
use crate::error::BondCashflowError;
use crate::time_value;
use crate::types::{Money, Rate};
use crate::BondCashflowResult;

/// How the yield figure was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldBasis {
    /// No market price supplied; the bond is assumed to trade at par, so
    /// the yield is the coupon rate.
    ParShortcut,
    /// Solved as the internal rate of return of `[-price, flows...]`.
    Solved,
}

/// Annualised yield-to-market and its periodic equivalent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldEstimate {
    pub ytm: Rate,
    pub periodic_yield: Rate,
    pub basis: YieldBasis,
}

/// Estimate yield-to-market for validated terms and their schedule.
///
/// Without a market price the coupon rate is returned as-is. Otherwise the
/// periodic IRR of `[-price, flow_1, ..., flow_n]` is found by Newton-Raphson
/// and multiplied by the payment frequency. Non-convergence is an error.
pub fn estimate_ytm(
    terms: &BondTerms,
    schedule: &CashFlowSchedule,
) -> BondCashflowResult<YieldEstimate> {
    let freq = terms.frequency();

    let Some(price) = terms.market_price else {
        return Ok(YieldEstimate {
            ytm: terms.coupon_rate,
            periodic_yield: terms.coupon_rate / freq,
            basis: YieldBasis::ParShortcut,
        });
    };

    let periodic_yield = solve_periodic_yield(price, schedule, terms.coupon_rate / freq)?;
    let ytm = periodic_yield * freq;
    debug!(%price, %ytm, "solved yield-to-market");

    Ok(YieldEstimate {
        ytm,
        periodic_yield,
        basis: YieldBasis::Solved,
    })
}

/// Periodic IRR of buying at `price` and receiving every scheduled amount.
pub fn solve_periodic_yield(
    price: Money,
    schedule: &CashFlowSchedule,
    guess: Rate,
) -> BondCashflowResult<Rate> {
    let mut series: Vec<Money> = Vec::with_capacity(schedule.flows.len() + 1);
    series.push(-price);
    series.extend(schedule.flows.iter().map(|f| f.amount));
    time_value::irr(&series, guess)
}

/// Annual coupon divided by price.
pub fn current_yield(terms: &BondTerms, price: Money) -> BondCashflowResult<Rate> {
    terms
        .principal
        .checked_mul(terms.coupon_rate)
        .and_then(|annual| annual.checked_div(price))
        .ok_or_else(|| BondCashflowError::DivisionByZero {
            context: "current yield: price is zero or too small".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::schedule::generate_schedule;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn terms(price: Option<Money>) -> BondTerms {
        BondTerms {
            principal: dec!(1000),
            coupon_rate: dec!(0.05),
            term_years: dec!(10),
            payment_frequency: 2,
            market_price: price,
        }
    }

    fn ytm_at(price: Option<Money>) -> YieldEstimate {
        let t = terms(price);
        let schedule = generate_schedule(&t);
        estimate_ytm(&t, &schedule).unwrap()
    }

    #[test]
    fn test_no_price_returns_coupon_rate_exactly() {
        let est = ytm_at(None);
        assert_eq!(est.ytm, dec!(0.05));
        assert_eq!(est.basis, YieldBasis::ParShortcut);
    }

    #[test]
    fn test_par_price_solves_to_coupon_rate() {
        let est = ytm_at(Some(dec!(1000)));
        assert_eq!(est.basis, YieldBasis::Solved);
        assert!((est.ytm - dec!(0.05)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_discount_bond_yields_above_coupon() {
        let est = ytm_at(Some(dec!(950)));
        assert!(est.ytm > dec!(0.05), "discount bond ytm {}", est.ytm);
    }

    #[test]
    fn test_premium_bond_yields_below_coupon() {
        let est = ytm_at(Some(dec!(1050)));
        assert!(est.ytm < dec!(0.05), "premium bond ytm {}", est.ytm);
    }

    #[test]
    fn test_known_discount_yield() {
        // 10y 5% semi-annual at 925.61 yields 6.0%
        let est = ytm_at(Some(dec!(925.61)));
        assert!(
            (est.ytm - dec!(0.06)).abs() < dec!(0.0001),
            "Expected ~6%, got {}",
            est.ytm
        );
    }

    #[test]
    fn test_periodic_yield_times_frequency() {
        let est = ytm_at(Some(dec!(980)));
        assert_eq!(est.periodic_yield * dec!(2), est.ytm);
    }

    #[test]
    fn test_current_yield() {
        let t = terms(Some(dec!(800)));
        assert_eq!(current_yield(&t, dec!(800)).unwrap(), dec!(0.0625));
        assert!(current_yield(&t, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_empty_schedule_cannot_be_solved() {
        let schedule = CashFlowSchedule {
            periods: 0,
            coupon_per_period: Decimal::ZERO,
            total_coupons: Decimal::ZERO,
            total_principal: Decimal::ZERO,
            total_cash_flow: Decimal::ZERO,
            flows: Vec::new(),
        };
        assert!(matches!(
            solve_periodic_yield(dec!(1000), &schedule, dec!(0.02)),
            Err(BondCashflowError::InsufficientData(_))
        ));
    }
}
