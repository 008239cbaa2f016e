use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Bond cash flows
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_payments(input_json: String) -> NapiResult<String> {
    let input: bond_cashflow_core::BondTerms =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = bond_cashflow_core::compute_payments(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_bond(input_json: String) -> NapiResult<String> {
    let input: bond_cashflow_core::BondTerms =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = bond_cashflow_core::analyze_bond(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn price_yield_sweep(input_json: String) -> NapiResult<String> {
    let input: bond_cashflow_core::PriceSweepInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = bond_cashflow_core::price_yield_sweep(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
