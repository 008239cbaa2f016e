use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::bond::duration;
use crate::bond::schedule::{generate_schedule, truncation_warnings, CashFlowSchedule};
use crate::bond::terms::BondTerms;
use crate::bond::yields::{self, YieldBasis};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::BondCashflowResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the price sits relative to principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceClassification {
    Premium,
    Discount,
    Par,
}

impl PriceClassification {
    pub fn of(price: Money, principal: Money) -> Self {
        if price > principal {
            PriceClassification::Premium
        } else if price < principal {
            PriceClassification::Discount
        } else {
            PriceClassification::Par
        }
    }
}

/// Yield and duration analytics derived from a schedule and a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldMetrics {
    /// Annualised yield-to-market
    pub ytm: Rate,
    /// Macaulay duration in years
    pub macaulay_duration: Years,
    /// Macaulay / (1 + ytm / frequency)
    pub modified_duration: Decimal,
    /// ytm / frequency
    pub periodic_yield: Rate,
    /// Annual coupon / price
    pub current_yield: Rate,
    /// Price the metrics were computed against
    pub price: Money,
    pub yield_basis: YieldBasis,
    pub price_classification: PriceClassification,
}

/// Everything a display needs for one refresh: the schedule and its analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondAnalysis {
    pub schedule: CashFlowSchedule,
    pub metrics: YieldMetrics,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate the terms, build the schedule, then derive yield-to-market and
/// duration.
pub fn analyze_bond(terms: &BondTerms) -> BondCashflowResult<ComputationOutput<BondAnalysis>> {
    let start = Instant::now();

    terms.validate()?;
    let warnings = truncation_warnings(terms);

    let schedule = generate_schedule(terms);
    let metrics = yield_metrics(terms, &schedule)?;

    let price_source = match metrics.yield_basis {
        YieldBasis::ParShortcut => "par (no market price supplied)",
        YieldBasis::Solved => "market price",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "payment_frequency": terms.payment_frequency,
        "price_source": price_source,
        "ytm_method": "Newton-Raphson IRR, annualised by frequency",
        "duration_timing": "period i at i / frequency years",
    });

    Ok(with_metadata(
        "Fixed-Rate Bond Cash Flows, Yield-to-Market & Macaulay Duration",
        &assumptions,
        warnings,
        elapsed,
        BondAnalysis { schedule, metrics },
    ))
}

/// Analytics for validated terms against an already generated schedule.
pub fn yield_metrics(
    terms: &BondTerms,
    schedule: &CashFlowSchedule,
) -> BondCashflowResult<YieldMetrics> {
    let estimate = yields::estimate_ytm(terms, schedule)?;
    let amounts = schedule.amounts();

    let macaulay_duration =
        duration::macaulay_duration(&amounts, estimate.ytm, terms.payment_frequency)?;
    let modified_duration =
        duration::modified_duration(macaulay_duration, estimate.ytm, terms.payment_frequency)?;

    let price = terms.price();

    Ok(YieldMetrics {
        ytm: estimate.ytm,
        macaulay_duration,
        modified_duration,
        periodic_yield: estimate.periodic_yield,
        current_yield: yields::current_yield(terms, price)?,
        price,
        yield_basis: estimate.basis,
        price_classification: PriceClassification::of(price, terms.principal),
    })
}
