use rust_decimal::Decimal;

use crate::error::BondCashflowError;
use crate::types::{Money, Rate, Years};
use crate::BondCashflowResult;

/// Macaulay duration of a periodic cash-flow series, in years.
///
/// Flow `i` (1-based) is received at `i / frequency` years and discounted by
/// `(1 + ytm / frequency)^i`; the result is the PV-weighted average time
/// divided by the total present value of the flows.
pub fn macaulay_duration(amounts: &[Money], ytm: Rate, frequency: u8) -> BondCashflowResult<Years> {
    let freq = Decimal::from(frequency);
    let one_plus_y = discount_base(ytm, freq)?;

    let mut weighted_sum = Decimal::ZERO;
    let mut pv_sum = Decimal::ZERO;
    let mut df = Decimal::ONE;

    for (i, cf) in amounts.iter().enumerate() {
        match df.checked_mul(one_plus_y) {
            Some(next) => df = next,
            // Later flows discount to nothing at this yield.
            None => break,
        }
        let t_years = Decimal::from(i as u64 + 1) / freq;
        let pv_cf = discounted(*cf, df)?;
        weighted_sum += t_years * pv_cf;
        pv_sum += pv_cf;
    }

    if pv_sum.is_zero() {
        return Err(BondCashflowError::DivisionByZero {
            context: "Macaulay duration: present value of cash flows is zero".to_string(),
        });
    }

    Ok(weighted_sum / pv_sum)
}

/// Modified duration: Macaulay / (1 + ytm / frequency).
pub fn modified_duration(macaulay: Years, ytm: Rate, frequency: u8) -> BondCashflowResult<Decimal> {
    let one_plus_y = discount_base(ytm, Decimal::from(frequency))?;
    Ok(macaulay / one_plus_y)
}

/// Present value of the flows at an annual yield, discounting per period.
pub fn present_value(amounts: &[Money], ytm: Rate, frequency: u8) -> BondCashflowResult<Money> {
    let one_plus_y = discount_base(ytm, Decimal::from(frequency))?;

    let mut pv = Decimal::ZERO;
    let mut df = Decimal::ONE;
    for cf in amounts {
        match df.checked_mul(one_plus_y) {
            Some(next) => df = next,
            None => break,
        }
        pv += discounted(*cf, df)?;
    }
    Ok(pv)
}

fn discounted(cf: Money, df: Decimal) -> BondCashflowResult<Money> {
    cf.checked_div(df)
        .ok_or_else(|| BondCashflowError::DivisionByZero {
            context: "duration: discounted cash flow exceeds Decimal range".to_string(),
        })
}

fn discount_base(ytm: Rate, freq: Decimal) -> BondCashflowResult<Decimal> {
    if freq.is_zero() {
        return Err(BondCashflowError::DivisionByZero {
            context: "duration: payment frequency is zero".to_string(),
        });
    }
    let one_plus_y = Decimal::ONE + ytm / freq;
    if one_plus_y <= Decimal::ZERO {
        return Err(BondCashflowError::InvalidInput {
            field: "ytm".into(),
            reason: "Periodic yield must be greater than -100%.".into(),
        });
    }
    Ok(one_plus_y)
}
