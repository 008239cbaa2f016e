use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::bond::terms::BondTerms;
use crate::types::{with_metadata, ComputationOutput, Money, Years};
use crate::BondCashflowResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One payment date of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    /// 1-based period index
    pub period: u32,
    /// Time of payment in years from issue
    pub time: Years,
    /// Coupon paid this period
    pub coupon: Money,
    /// Principal repaid this period (non-zero only on the final period)
    pub principal: Money,
    /// coupon + principal
    pub amount: Money,
}

/// Full payment schedule of a bullet bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSchedule {
    /// Number of payment periods, `floor(term * frequency)`
    pub periods: u32,
    /// Flat coupon paid each period: principal * rate / frequency
    pub coupon_per_period: Money,
    /// Sum of all coupons (excludes redemption)
    pub total_coupons: Money,
    /// Principal repaid at maturity
    pub total_principal: Money,
    /// Sum of every payment amount
    pub total_cash_flow: Money,
    pub flows: Vec<CashFlow>,
}

impl CashFlowSchedule {
    /// Payment amounts in period order.
    pub fn amounts(&self) -> Vec<Money> {
        self.flows.iter().map(|f| f.amount).collect()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate the terms and build the bond's payment schedule.
pub fn compute_payments(
    terms: &BondTerms,
) -> BondCashflowResult<ComputationOutput<CashFlowSchedule>> {
    let start = Instant::now();

    terms.validate()?;
    let warnings = truncation_warnings(terms);

    let schedule = generate_schedule(terms);

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "payment_frequency": terms.payment_frequency,
        "redemption": "bullet (full principal with final coupon)",
        "time_spacing": "equal over (0, term]",
    });

    Ok(with_metadata(
        "Fixed-Rate Bond Cash Flow Schedule",
        &assumptions,
        warnings,
        elapsed,
        schedule,
    ))
}

/// Build the payment schedule for already-validated terms.
///
/// Payments fall at `term * i / periods` for i = 1..=periods, each carrying the
/// flat coupon; the principal rides on the last one. `BondTerms::validate`
/// bounds the period count and every total computed here.
pub fn generate_schedule(terms: &BondTerms) -> CashFlowSchedule {
    let periods = terms.period_count();
    let coupon = terms.principal * terms.coupon_rate / terms.frequency();
    let period_count = Decimal::from(periods);

    let mut flows: Vec<CashFlow> = Vec::with_capacity(periods as usize);
    let mut total_cash_flow = Decimal::ZERO;

    for period in 1..=periods {
        let time = terms.term_years * Decimal::from(period) / period_count;
        let principal = if period == periods {
            terms.principal
        } else {
            Decimal::ZERO
        };
        let amount = coupon + principal;
        total_cash_flow += amount;
        flows.push(CashFlow {
            period,
            time,
            coupon,
            principal,
            amount,
        });
    }

    let total_principal = if periods > 0 {
        terms.principal
    } else {
        Decimal::ZERO
    };

    CashFlowSchedule {
        periods,
        coupon_per_period: coupon,
        total_coupons: coupon * period_count,
        total_principal,
        total_cash_flow,
        flows,
    }
}

/// Warnings shared by every entry point that builds a schedule.
pub(crate) fn truncation_warnings(terms: &BondTerms) -> Vec<String> {
    if !terms.is_truncated() {
        return Vec::new();
    }
    let periods = terms.period_count();
    warn!(
        term_years = %terms.term_years,
        payment_frequency = terms.payment_frequency,
        periods,
        "term does not divide into whole payment periods; truncating"
    );
    vec![format!(
        "Term of {} years at frequency {} is not a whole number of periods; truncated to {} periods.",
        terms.term_years, terms.payment_frequency, periods
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn standard_terms() -> BondTerms {
        BondTerms {
            principal: dec!(1000),
            coupon_rate: dec!(0.05),
            term_years: dec!(10),
            payment_frequency: 2,
            market_price: None,
        }
    }

    #[test]
    fn test_standard_semi_annual_schedule() {
        let schedule = generate_schedule(&standard_terms());

        assert_eq!(schedule.periods, 20);
        assert_eq!(schedule.flows.len(), 20);
        for flow in &schedule.flows[..19] {
            assert_eq!(flow.amount, dec!(25));
            assert_eq!(flow.principal, Decimal::ZERO);
        }
        let last = schedule.flows.last().unwrap();
        assert_eq!(last.amount, dec!(1025));
        assert_eq!(last.principal, dec!(1000));
        assert_eq!(schedule.total_cash_flow, dec!(1500));
        assert_eq!(schedule.total_coupons, dec!(500));
    }

    #[test]
    fn test_times_evenly_spaced_to_maturity() {
        let schedule = generate_schedule(&standard_terms());
        assert_eq!(schedule.flows[0].time, dec!(0.5));
        assert_eq!(schedule.flows[1].time, dec!(1));
        assert_eq!(schedule.flows[19].time, dec!(10));
        for pair in schedule.flows.windows(2) {
            assert_eq!(pair[1].time - pair[0].time, dec!(0.5));
        }
    }

    #[test]
    fn test_coupons_sum_to_principal_rate_term() {
        for freq in [1u8, 2, 4] {
            let terms = BondTerms {
                payment_frequency: freq,
                ..standard_terms()
            };
            let schedule = generate_schedule(&terms);
            let coupon_sum: Decimal = schedule.flows.iter().map(|f| f.coupon).sum();
            assert_eq!(coupon_sum, dec!(1000) * dec!(0.05) * dec!(10));
        }
    }

    #[test]
    fn test_zero_coupon_single_redemption() {
        let terms = BondTerms {
            coupon_rate: Decimal::ZERO,
            ..standard_terms()
        };
        let schedule = generate_schedule(&terms);
        let non_zero: Vec<&CashFlow> = schedule
            .flows
            .iter()
            .filter(|f| !f.amount.is_zero())
            .collect();
        assert_eq!(non_zero.len(), 1);
        assert_eq!(non_zero[0].period, 20);
        assert_eq!(schedule.total_cash_flow, dec!(1000));
    }

    #[test]
    fn test_single_period_carries_coupon_and_principal() {
        let terms = BondTerms {
            term_years: dec!(1),
            payment_frequency: 1,
            ..standard_terms()
        };
        let schedule = generate_schedule(&terms);
        assert_eq!(schedule.periods, 1);
        assert_eq!(schedule.flows[0].amount, dec!(1050));
        assert_eq!(schedule.flows[0].time, dec!(1));
    }

    #[test]
    fn test_fractional_term_truncates_and_warns() {
        let terms = BondTerms {
            term_years: dec!(2.3),
            ..standard_terms()
        };
        let result = compute_payments(&terms).unwrap();
        assert_eq!(result.result.periods, 4);
        assert_eq!(result.result.flows[3].time, dec!(2.3));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_compute_payments_rejects_invalid_frequency() {
        let terms = BondTerms {
            payment_frequency: 3,
            ..standard_terms()
        };
        assert!(compute_payments(&terms).is_err());
    }

    #[test]
    fn test_metadata_populated() {
        let result = compute_payments(&standard_terms()).unwrap();
        assert!(!result.methodology.is_empty());
        assert_eq!(result.metadata.precision, "rust_decimal_128bit");
        assert!(result.warnings.is_empty());
    }
}
