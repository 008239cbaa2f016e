use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serde_json::Value;

use bond_cashflow_core::{
    analyze_bond, compute_payments, price_yield_sweep, BondTerms, PriceSweepInput,
    SensitivityVariable,
};

use crate::input;

/// Bond terms given as individual flags. Defaults describe a 10-year 5%
/// semi-annual bond of 1000 principal.
#[derive(Args)]
pub struct BondTermsArgs {
    /// Principal repaid at maturity
    #[arg(long, default_value = "1000")]
    pub principal: Decimal,

    /// Annual coupon rate as a decimal (e.g. 0.05 for 5%)
    #[arg(long, default_value = "0.05")]
    pub coupon_rate: Decimal,

    /// Term in years
    #[arg(long = "term", alias = "term-years", default_value = "10")]
    pub term_years: Decimal,

    /// Payments per year: 1, 2 or 4
    #[arg(long = "frequency", alias = "payment-frequency", default_value_t = 2)]
    pub payment_frequency: u8,
}

impl BondTermsArgs {
    fn to_terms(&self, market_price: Option<Decimal>) -> BondTerms {
        BondTerms {
            principal: self.principal,
            coupon_rate: self.coupon_rate,
            term_years: self.term_years,
            payment_frequency: self.payment_frequency,
            market_price,
        }
    }
}

/// Arguments for the payment schedule
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub terms: BondTermsArgs,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for schedule, yield-to-market and duration
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub terms: BondTermsArgs,

    /// Market price; omit to price at par
    #[arg(long = "price", alias = "market-price")]
    pub market_price: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a price / yield sweep
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SweepArgs {
    #[command(flatten)]
    pub terms: BondTermsArgs,

    /// Lowest price to evaluate
    #[arg(long)]
    pub min_price: Option<Decimal>,

    /// Highest price to evaluate
    #[arg(long)]
    pub max_price: Option<Decimal>,

    /// Price increment between evaluations
    #[arg(long, default_value = "10")]
    pub step: Decimal,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Resolve input from file, then stdin, then the flag-built fallback.
fn resolve_input<T, F>(path: &Option<String>, from_flags: F) -> Result<T, Box<dyn std::error::Error>>
where
    T: DeserializeOwned,
    F: FnOnce() -> Result<T, Box<dyn std::error::Error>>,
{
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        from_flags()
    }
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: BondTerms = resolve_input(&args.input, || Ok(args.terms.to_terms(None)))?;
    let result = compute_payments(&terms)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: BondTerms =
        resolve_input(&args.input, || Ok(args.terms.to_terms(args.market_price)))?;
    let result = analyze_bond(&terms)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_sweep(args: SweepArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sweep_input: PriceSweepInput = resolve_input(&args.input, || {
        let principal = args.terms.principal;
        Ok(PriceSweepInput {
            terms: args.terms.to_terms(None),
            price: SensitivityVariable {
                name: "price".into(),
                min: args.min_price.unwrap_or(principal * dec!(0.8)),
                max: args.max_price.unwrap_or(principal * dec!(1.2)),
                step: args.step,
            },
        })
    })?;
    let result = price_yield_sweep(&sweep_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use std::str::FromStr;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        terms: BondTermsArgs,
    }

    #[test]
    fn test_flag_defaults_describe_reference_bond() {
        let cli = TestCli::parse_from(["bondcf"]);
        let terms = cli.terms.to_terms(None);
        assert_eq!(terms.principal, dec!(1000));
        assert_eq!(terms.coupon_rate, dec!(0.05));
        assert_eq!(terms.term_years, dec!(10));
        assert_eq!(terms.payment_frequency, 2);
        assert_eq!(terms.market_price, None);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::parse_from([
            "bondcf",
            "--principal",
            "500",
            "--coupon-rate",
            "0.04",
            "--term",
            "3",
            "--frequency",
            "4",
        ]);
        let terms = cli.terms.to_terms(Some(dec!(490)));
        assert_eq!(terms.principal, dec!(500));
        assert_eq!(terms.payment_frequency, 4);
        assert_eq!(terms.market_price, Some(dec!(490)));
        assert!(terms.validate().is_ok());
    }

    fn conflicting_flags() -> BondTermsArgs {
        BondTermsArgs {
            principal: dec!(500),
            coupon_rate: dec!(0.08),
            term_years: dec!(3),
            payment_frequency: 4,
        }
    }

    #[test]
    fn test_input_file_takes_precedence_over_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"principal": "1000", "coupon_rate": "0.05", "term_years": "10", "payment_frequency": 2}}"#
        )
        .unwrap();

        let args = AnalyzeArgs {
            terms: conflicting_flags(),
            market_price: Some(dec!(450)),
            input: Some(file.path().to_str().unwrap().to_string()),
        };
        let value = run_analyze(args).unwrap();
        let result = &value["result"];

        assert_eq!(result["schedule"]["periods"], 20);
        assert_eq!(result["metrics"]["yield_basis"], "par_shortcut");
        let ytm = Decimal::from_str(result["metrics"]["ytm"].as_str().unwrap()).unwrap();
        assert_eq!(ytm, dec!(0.05));
    }

    #[test]
    fn test_missing_input_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("terms.json");
        let args = ScheduleArgs {
            terms: conflicting_flags(),
            input: Some(missing.to_str().unwrap().to_string()),
        };
        let err = run_schedule(args).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_invalid_terms_in_file_surface_core_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"principal": "1000", "coupon_rate": "0.05", "term_years": "10", "payment_frequency": 3}}"#
        )
        .unwrap();

        let args = ScheduleArgs {
            terms: conflicting_flags(),
            input: Some(file.path().to_str().unwrap().to_string()),
        };
        let err = run_schedule(args).unwrap_err();
        assert!(err.to_string().contains("payment_frequency"));
    }
}
