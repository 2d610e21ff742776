//! Monthly cost and savings estimation

use crate::error::percentage;
use crate::models::Priced;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Billing hours in a month (8760 / 12)
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Multiplier applied to Serverless cost; 1.0 means list price
pub const DEFAULT_PREMIUM_FACTOR: f64 = 1.0;

/// Savings above this percentage yield a strong recommendation
pub const STRONG_RECOMMENDATION_SAVINGS_PCT: f64 = 10.0;

/// Savings above this percentage yield a weak recommendation
pub const CONSIDER_RECOMMENDATION_SAVINGS_PCT: f64 = 0.0;

fn default_hours_per_month() -> f64 {
    HOURS_PER_MONTH
}

fn default_premium_factor() -> f64 {
    DEFAULT_PREMIUM_FACTOR
}

fn default_strong_pct() -> f64 {
    STRONG_RECOMMENDATION_SAVINGS_PCT
}

fn default_consider_pct() -> f64 {
    CONSIDER_RECOMMENDATION_SAVINGS_PCT
}

/// Tunables of the cost model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSettings {
    #[serde(default = "default_hours_per_month")]
    pub hours_per_month: f64,

    #[serde(default = "default_premium_factor")]
    pub premium_factor: f64,

    #[serde(default = "default_strong_pct")]
    pub strong_recommendation_pct: f64,

    #[serde(default = "default_consider_pct")]
    pub consider_recommendation_pct: f64,
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            hours_per_month: default_hours_per_month(),
            premium_factor: default_premium_factor(),
            strong_recommendation_pct: default_strong_pct(),
            consider_recommendation_pct: default_consider_pct(),
        }
    }
}

/// Migration advice derived from the savings percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StronglyRecommend,
    Consider,
    KeepProvisioned,
    /// Savings percentage is undefined (no current cost)
    Undetermined,
}

impl Recommendation {
    pub fn from_savings(savings_percentage: Option<f64>, settings: &CostSettings) -> Self {
        match savings_percentage {
            Some(pct) if pct > settings.strong_recommendation_pct => Recommendation::StronglyRecommend,
            Some(pct) if pct > settings.consider_recommendation_pct => Recommendation::Consider,
            Some(_) => Recommendation::KeepProvisioned,
            None => Recommendation::Undetermined,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::StronglyRecommend => write!(f, "Strongly recommend migrating to Serverless"),
            Recommendation::Consider => write!(f, "Consider migrating to Serverless"),
            Recommendation::KeepProvisioned => write!(f, "Keep the provisioned cluster"),
            Recommendation::Undetermined => write!(f, "Undetermined (no current cost)"),
        }
    }
}

/// Priced inputs to the cost model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostInputs {
    pub node_count: u32,
    pub node_hourly_rate: Priced,
    pub rpu_hourly_rate: Priced,
    pub rpu_count: u32,
}

/// Monthly cost comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub active_fraction: f64,
    pub active_hours_per_month: f64,
    pub hours_per_month: f64,
    pub premium_factor: f64,
    pub node_count: u32,
    pub node_hourly_rate: Priced,
    pub rpu_count: u32,
    pub rpu_hourly_rate: Priced,
    pub current_monthly_cost: f64,
    pub serverless_monthly_cost: f64,
    pub savings: f64,
    /// `None` when the current monthly cost is zero
    pub savings_percentage: Option<f64>,
    /// Activity fraction at which both options cost the same
    ///
    /// Above 1.0 Serverless is cheaper even at full utilisation. `None`
    /// when a full month of Serverless would cost nothing.
    pub break_even_usage_ratio: Option<f64>,
    pub recommendation: Recommendation,
    pub currency: String,
}

impl CostBreakdown {
    pub fn break_even_usage_percentage(&self) -> Option<f64> {
        self.break_even_usage_ratio.map(|r| r * 100.0)
    }

    /// Node and RPU prices are quoted in different currencies
    pub fn has_currency_mismatch(&self) -> bool {
        self.node_hourly_rate.currency != self.rpu_hourly_rate.currency
    }
}

/// Pure cost model over activity fraction and priced inputs
#[derive(Debug, Clone, Default)]
pub struct CostEstimator {
    settings: CostSettings,
}

impl CostEstimator {
    pub fn new(settings: CostSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CostSettings {
        &self.settings
    }

    pub fn current_monthly_cost(&self, inputs: &CostInputs) -> f64 {
        inputs.node_hourly_rate.value * f64::from(inputs.node_count) * self.settings.hours_per_month
    }

    /// Serverless cost for a month with `active_hours` of billed activity
    pub fn serverless_monthly_cost(&self, active_hours: f64, inputs: &CostInputs) -> f64 {
        active_hours
            * inputs.rpu_hourly_rate.value
            * f64::from(inputs.rpu_count)
            * self.settings.premium_factor
    }

    /// Estimate costs for `active_fraction` (clamped to `[0, 1]`)
    pub fn estimate(&self, active_fraction: f64, inputs: &CostInputs) -> CostBreakdown {
        let active_fraction = if active_fraction.is_finite() {
            active_fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let hours = self.settings.hours_per_month;
        let active_hours = active_fraction * hours;

        let current = self.current_monthly_cost(inputs);
        let serverless = self.serverless_monthly_cost(active_hours, inputs);
        let savings = current - serverless;
        let savings_percentage = percentage(savings, current, "current monthly cost").ok();

        // current == fraction * full_month_serverless
        let full_month_serverless = self.serverless_monthly_cost(hours, inputs);
        let break_even_usage_ratio = if full_month_serverless > 0.0 && full_month_serverless.is_finite() {
            Some(current / full_month_serverless)
        } else {
            None
        };

        CostBreakdown {
            active_fraction,
            active_hours_per_month: active_hours,
            hours_per_month: hours,
            premium_factor: self.settings.premium_factor,
            node_count: inputs.node_count,
            node_hourly_rate: inputs.node_hourly_rate.clone(),
            rpu_count: inputs.rpu_count,
            rpu_hourly_rate: inputs.rpu_hourly_rate.clone(),
            current_monthly_cost: current,
            serverless_monthly_cost: serverless,
            savings,
            savings_percentage,
            break_even_usage_ratio,
            recommendation: Recommendation::from_savings(savings_percentage, &self.settings),
            currency: inputs.node_hourly_rate.currency.clone(),
        }
    }
}
