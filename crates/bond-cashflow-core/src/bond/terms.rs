use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BondCashflowError;
use crate::types::{Money, Rate, Years};
use crate::BondCashflowResult;

/// Payment frequencies accepted by the calculator (annual, semi-annual, quarterly).
pub const SUPPORTED_FREQUENCIES: [u8; 3] = [1, 2, 4];

/// Longest schedule the calculator will build.
pub const MAX_PERIODS: u32 = 10_000;

/// Terms of a fixed-rate bullet bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondTerms {
    /// Principal (par) amount repaid at maturity, e.g. 1000
    pub principal: Money,
    /// Annual coupon rate as a decimal (0.05 = 5%)
    pub coupon_rate: Rate,
    /// Years until the final payment
    pub term_years: Years,
    /// Coupon payments per year: 1 (annual), 2 (semi), 4 (quarterly)
    pub payment_frequency: u8,
    /// Purchase price. When absent the bond is taken to trade at par.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_price: Option<Money>,
}

impl BondTerms {
    /// Reject any input the calculator cannot price. Runs before a schedule
    /// is generated; nothing downstream re-checks these bounds.
    pub fn validate(&self) -> BondCashflowResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(BondCashflowError::invalid(
                "principal",
                "Principal must be positive.",
            ));
        }
        if self.coupon_rate < Decimal::ZERO {
            return Err(BondCashflowError::invalid(
                "coupon_rate",
                "Coupon rate must be non-negative.",
            ));
        }
        if self.term_years <= Decimal::ZERO {
            return Err(BondCashflowError::invalid(
                "term_years",
                "Term must be positive.",
            ));
        }
        if !SUPPORTED_FREQUENCIES.contains(&self.payment_frequency) {
            return Err(BondCashflowError::invalid(
                "payment_frequency",
                "Frequency must be 1, 2, or 4.",
            ));
        }
        if let Some(price) = self.market_price {
            if price <= Decimal::ZERO {
                return Err(BondCashflowError::invalid(
                    "market_price",
                    "Market price must be positive.",
                ));
            }
        }

        let Some(raw_periods) = self.raw_periods() else {
            return Err(BondCashflowError::invalid(
                "term_years",
                "Term times frequency is too large to represent.",
            ));
        };
        if raw_periods < Decimal::ONE {
            return Err(BondCashflowError::invalid(
                "term_years",
                "Term times frequency must cover at least one payment period.",
            ));
        }
        if raw_periods.floor() > Decimal::from(MAX_PERIODS) {
            return Err(BondCashflowError::InvalidInput {
                field: "term_years".into(),
                reason: format!("Term times frequency exceeds {MAX_PERIODS} payment periods."),
            });
        }

        // Coupon, total coupons and total cash flow must all stay in range.
        let total_cash_flow = self
            .coupon_per_period()
            .and_then(|c| c.checked_mul(raw_periods.floor()))
            .and_then(|coupons| coupons.checked_add(self.principal));
        if total_cash_flow.is_none() {
            return Err(BondCashflowError::invalid(
                "coupon_rate",
                "Coupon payments are too large to represent.",
            ));
        }
        Ok(())
    }

    /// Payment frequency as a Decimal divisor.
    pub fn frequency(&self) -> Decimal {
        Decimal::from(self.payment_frequency)
    }

    /// Number of payment periods: `floor(term_years * payment_frequency)`.
    pub fn period_count(&self) -> u32 {
        self.raw_periods()
            .and_then(|p| p.floor().to_u32())
            .unwrap_or(0)
    }

    /// True when `term_years * payment_frequency` had a fractional part that
    /// `period_count` dropped.
    pub fn is_truncated(&self) -> bool {
        self.raw_periods().is_some_and(|p| !p.fract().is_zero())
    }

    /// Flat coupon paid each period, `None` if it overflows Decimal.
    pub fn coupon_per_period(&self) -> Option<Money> {
        self.principal
            .checked_mul(self.coupon_rate)?
            .checked_div(self.frequency())
    }

    /// Price used for yield analytics: the market price, else par.
    pub fn price(&self) -> Money {
        self.market_price.unwrap_or(self.principal)
    }

    fn raw_periods(&self) -> Option<Decimal> {
        self.term_years.checked_mul(self.frequency())
    }
}
