use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::bond::analysis::{yield_metrics, PriceClassification};
use crate::bond::schedule::{generate_schedule, truncation_warnings};
use crate::bond::terms::BondTerms;
use crate::error::BondCashflowError;
use crate::types::*;
use crate::BondCashflowResult;

/// Upper bound on sweep points, keeps a mistyped step from running away.
const MAX_SWEEP_POINTS: usize = 1_000;

/// Input for a price sweep: base terms plus the price range to evaluate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSweepInput {
    /// Base bond terms. Any `market_price` here is replaced by each swept price.
    pub terms: BondTerms,
    /// Price range; `name` is informational.
    pub price: SensitivityVariable,
}

/// Analytics at a single swept price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSweepPoint {
    pub price: Money,
    pub ytm: Rate,
    pub macaulay_duration: Years,
    pub price_classification: PriceClassification,
}

/// Output of a price sweep, ordered by ascending price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSweepOutput {
    pub variable_name: String,
    pub results: Vec<PriceSweepPoint>,
}

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> BondCashflowResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(BondCashflowError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(BondCashflowError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Min must be <= max".into(),
        });
    }
    let steps = (var.max - var.min).checked_div(var.step);
    if steps.map_or(true, |n| n >= Decimal::from(MAX_SWEEP_POINTS as u64)) {
        return Err(BondCashflowError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: format!("Sweep would exceed {MAX_SWEEP_POINTS} points"),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        current += var.step;
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

/// Re-solve yield and duration across a range of purchase prices, holding
/// the other terms fixed.
pub fn price_yield_sweep(
    input: &PriceSweepInput,
) -> BondCashflowResult<ComputationOutput<PriceSweepOutput>> {
    let start = Instant::now();

    input.terms.validate()?;
    if input.price.min <= Decimal::ZERO {
        return Err(BondCashflowError::InvalidInput {
            field: format!("variable:{}", input.price.name),
            reason: "Swept prices must be positive".into(),
        });
    }
    let prices = generate_sweep_values(&input.price)?;
    let warnings = truncation_warnings(&input.terms);

    // The schedule does not depend on price.
    let schedule = generate_schedule(&input.terms);

    let mut results = Vec::with_capacity(prices.len());
    for price in prices {
        let terms = BondTerms {
            market_price: Some(price),
            ..input.terms.clone()
        };
        let metrics = yield_metrics(&terms, &schedule)?;
        results.push(PriceSweepPoint {
            price,
            ytm: metrics.ytm,
            macaulay_duration: metrics.macaulay_duration,
            price_classification: metrics.price_classification,
        });
    }

    let output = PriceSweepOutput {
        variable_name: input.price.name.clone(),
        results,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Price / Yield Sensitivity Sweep",
        &serde_json::json!({
            "variable": input.price.name,
            "min": input.price.min.to_string(),
            "max": input.price.max.to_string(),
            "step": input.price.step.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
