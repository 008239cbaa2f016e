pub mod bond;
pub mod error;
pub mod time_value;
pub mod types;

pub use bond::analysis::{analyze_bond, BondAnalysis, PriceClassification, YieldMetrics};
pub use bond::schedule::{compute_payments, generate_schedule, CashFlow, CashFlowSchedule};
pub use bond::sensitivity::{price_yield_sweep, PriceSweepInput, PriceSweepOutput};
pub use bond::terms::BondTerms;
pub use error::BondCashflowError;
pub use types::*;

/// Standard result type for all bond cash-flow operations
pub type BondCashflowResult<T> = Result<T, BondCashflowError>;
