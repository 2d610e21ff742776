//! Provisioned vs. Serverless cost comparison
//!
//! This module provides:
//! - RPU sizing from node configuration via a lookup table
//! - Monthly cost, savings and break-even usage for a given activity level
//! - Tiered migration recommendations

mod estimator;
mod rpu;

pub use estimator::{
    CostBreakdown, CostEstimator, CostInputs, CostSettings, Recommendation,
    CONSIDER_RECOMMENDATION_SAVINGS_PCT, DEFAULT_PREMIUM_FACTOR, HOURS_PER_MONTH,
    STRONG_RECOMMENDATION_SAVINGS_PCT,
};
pub use rpu::{NodeEquivalent, RpuSizing, MIN_RPU, RPU_PER_XLPLUS, RPU_STEP};
